//! Middleware Injector: wires Dojo middleware into widget source files
//!
//! Given a widget module and a middleware name (`theme`, `i18n`, `store`,
//! `icache`, ...), computes the text edits that add the middleware import,
//! register it with the module's `create(...)` call, and destructure it in the
//! `factory(function ...)` render function. `theme` and `i18n` also get a
//! companion stylesheet or message bundle.
//!
//! # Architecture
//!
//! Anchors are found by line-based pattern matching ([`patterns`],
//! [`locator`]) against an immutable [`Document`] snapshot. Each anchor's
//! shape decides how it is rewritten, and every rewrite is staged in an
//! [`EditBatch`] that is applied in one atomic operation afterwards. No step
//! reads edits queued by an earlier step.
//!
//! # Example
//!
//! ```
//! use middleware_injector::{DryRunStore, Document, FormattingOptions, Injector};
//!
//! let source = "\
//! import { create, tsx } from '@dojo/framework/core/vdom';
//!
//! const factory = create();
//! ";
//! let doc = Document::new("src/Hello.tsx", source);
//! let injector = Injector::with_builtins().unwrap();
//! let injection = injector
//!     .inject(&doc, &FormattingOptions::default(), "icache", &mut DryRunStore::default())
//!     .unwrap();
//!
//! let updated = injection.edits.apply_to_str(source).unwrap();
//! assert!(updated.contains("import icache from '@dojo/framework/core/middleware/icache';"));
//! assert!(updated.contains("create({ icache })"));
//! ```

pub mod assets;
pub mod capability;
pub mod config;
pub mod document;
pub mod edit;
pub mod format;
pub mod inject;
pub mod locator;
pub mod patterns;

// Re-exports
pub use assets::{AssetOutcome, AssetStore, DiskStore, DryRunStore};
pub use capability::{AssetKind, Capability, CapabilityRegistry};
pub use config::{load_from_path, load_from_str, ConfigError, InjectorConfig};
pub use document::{Document, Line, LineEnding, TextRange};
pub use edit::{Edit, EditBatch, EditError, EditKind, EditVerification};
pub use format::{tab_count, FormattingOptions};
pub use inject::{InjectError, Injection, Injector};
pub use locator::{find_line, FindOptions, LineMatch};
pub use patterns::{Capture, Pattern, PatternError, PatternMatch, PatternSet};
