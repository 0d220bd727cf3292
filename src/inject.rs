//! The middleware injector.
//!
//! Four steps run against one immutable [`Document`] snapshot:
//!
//! 1. import: add `import <symbol> from '<prefix>/<name>';` after the vdom import
//! 2. factory call: add the capability to `create(...)`
//! 3. companion assets: import and provision stylesheet or message bundle
//! 4. widget factory: add the capability to `middleware: { ... }` of
//!    `factory(function ...)`, then the capability's follow-up line
//!
//! Every anchor is located once against the pre-edit text, and each step is
//! skipped when its anchor is missing.

use crate::assets::{self, AssetOutcome, AssetStore};
use crate::capability::{Capability, CapabilityRegistry};
use crate::document::Document;
use crate::edit::EditBatch;
use crate::format::{tab_count, FormattingOptions};
use crate::locator::{find_line, FindOptions, LineMatch};
use crate::patterns::{Capture, Pattern, PatternError, PatternSet};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_MODULE_PREFIX: &str = "@dojo/framework/core/middleware";

#[derive(Error, Debug)]
pub enum InjectError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("failed to write companion file {path}: {source}")]
    AssetWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything one invocation produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Injection {
    pub edits: EditBatch,
    pub assets: Vec<AssetOutcome>,
}

/// How an anchor line gets the capability added.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape<'d> {
    /// `{ ... }` already on the line
    Existing(Capture<'d>),
    /// Opening brace ends the line; the capability goes on a new line
    Alone,
    /// Neither; the line is rewritten to introduce the argument
    Wrap,
    /// Recognized but nothing to do
    Untouched,
}

/// Computes edit batches for one capability registry and pattern set.
#[derive(Debug, Clone)]
pub struct Injector {
    patterns: PatternSet,
    registry: CapabilityRegistry,
    module_prefix: String,
}

impl Injector {
    pub fn new(registry: CapabilityRegistry) -> Result<Self, InjectError> {
        Ok(Self {
            patterns: PatternSet::compile()?,
            registry,
            module_prefix: DEFAULT_MODULE_PREFIX.to_string(),
        })
    }

    /// Injector with the built-in capability registry.
    pub fn with_builtins() -> Result<Self, InjectError> {
        Self::new(CapabilityRegistry::builtin())
    }

    pub fn with_module_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.module_prefix = prefix.into();
        self
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Produce the edit batch that wires `capability` into `document`.
    ///
    /// Companion files are written through `store`; nothing else touches
    /// the file system.
    pub fn inject(
        &self,
        document: &Document,
        options: &FormattingOptions,
        capability: &str,
        store: &mut dyn AssetStore,
    ) -> Result<Injection, InjectError> {
        let capability = self.registry.resolve(capability);
        let mut step = Step {
            patterns: &self.patterns,
            document,
            capability: &capability,
            tab: options.tab(),
            eol: options.eol(document),
            edits: EditBatch::new(),
        };

        step.import(&self.module_prefix);
        step.factory_call();
        let assets = step.companion_assets(store)?;
        step.widget_factory();

        tracing::debug!(
            capability = %capability.name,
            file = %document.path().display(),
            edits = step.edits.len(),
            "computed edit batch"
        );

        Ok(Injection {
            edits: step.edits,
            assets,
        })
    }
}

struct Step<'a> {
    patterns: &'a PatternSet,
    document: &'a Document,
    capability: &'a Capability,
    tab: String,
    eol: &'static str,
    edits: EditBatch,
}

impl<'a> Step<'a> {
    fn find(&self, pattern: &Pattern) -> Option<LineMatch<'a>> {
        find_line(self.document, pattern, FindOptions::default())
    }

    /// Queue `text` as a new line directly below `anchor`.
    fn insert_after(&mut self, anchor: &LineMatch<'_>, text: &str) {
        let position = anchor.range_including_line_break.end;
        if anchor.has_line_break() {
            self.edits.insert(position, format!("{text}{}", self.eol));
        } else {
            // Last line of the file: the new line needs a terminator before it
            self.edits.insert(position, format!("{}{text}", self.eol));
        }
    }

    fn replace_line(&mut self, anchor: &LineMatch<'_>, text: String) {
        if text == anchor.text {
            return;
        }
        self.edits.replace(anchor.range, anchor.text, text);
    }

    /// Insert `<name>,` one level deeper than `anchor`.
    fn insert_entry(&mut self, anchor: &LineMatch<'_>) {
        let depth = tab_count(anchor.text, &self.tab);
        let line = format!("{}{},", self.tab.repeat(depth), self.capability.name);
        self.insert_after(anchor, &line);
    }

    fn import(&mut self, module_prefix: &str) {
        let Some(anchor) = self.find(&self.patterns.vdom_import) else {
            tracing::debug!("no vdom import, skipping import");
            return;
        };
        let statement = format!(
            "import {} from '{}/{}';",
            self.capability.symbol, module_prefix, self.capability.name
        );
        self.insert_after(&anchor, &statement);
    }

    fn factory_call(&mut self) {
        let Some(anchor) = self.find(&self.patterns.create_line) else {
            tracing::debug!("no create() call, skipping factory call");
            return;
        };

        let shape = match anchor.capture {
            Some(object) => Shape::Existing(object),
            None if self.patterns.create_alone.is_match(anchor.text) => Shape::Alone,
            None => Shape::Wrap,
        };
        tracing::debug!(line = anchor.index, ?shape, "factory call");

        match shape {
            Shape::Existing(object) => {
                let appended = append_to_object(object.text, &self.capability.name);
                let updated = object.splice(anchor.text, &appended);
                self.replace_line(&anchor, updated);
            }
            Shape::Alone => self.insert_entry(&anchor),
            Shape::Wrap => {
                let updated = anchor.text.replacen(
                    "create()",
                    &format!("create({{ {} }})", self.capability.name),
                    1,
                );
                self.replace_line(&anchor, updated);
            }
            Shape::Untouched => {}
        }

        if let Some(declaration) = self.capability.pre_call_line() {
            self.edits
                .insert(anchor.range.start, format!("{declaration}{}", self.eol));
        }
    }

    fn companion_assets(
        &mut self,
        store: &mut dyn AssetStore,
    ) -> Result<Vec<AssetOutcome>, InjectError> {
        let Some(kind) = self.capability.asset else {
            return Ok(Vec::new());
        };
        let Some(anchor) = find_line(
            self.document,
            &self.patterns.import_line,
            FindOptions::reverse(),
        ) else {
            tracing::debug!("no import statements, skipping companion assets");
            return Ok(Vec::new());
        };
        let document = self.document;
        let Some(stem) = document.file_stem() else {
            tracing::warn!(
                file = %document.path().display(),
                "document has no file name, skipping companion assets"
            );
            return Ok(Vec::new());
        };

        self.insert_after(&anchor, &kind.import_statement(stem));

        let files = kind.files(document.dir(), stem, self.eol);
        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            let path = file.path.clone();
            let written = assets::provision(store, vec![file])
                .map_err(|source| InjectError::AssetWrite { path, source })?;
            outcomes.extend(written);
        }
        Ok(outcomes)
    }

    fn widget_factory(&mut self) {
        let Some(start) = self.find(&self.patterns.widget_factory_start) else {
            tracing::debug!("no factory(function ...) call, skipping widget factory");
            return;
        };

        let mut anchor = start;
        if !self.patterns.widget_factory_end.is_match(start.text) {
            // Arguments span several lines; find the one carrying `middleware:`
            if let Some(inner) = find_line(
                self.document,
                &self.patterns.widget_factory_middleware,
                FindOptions::bounded(start.index, &self.patterns.widget_factory_end),
            ) {
                anchor = inner;
            }
        }

        let name = self.capability.name.clone();
        let shape = match self.patterns.widget_factory_middleware.find(anchor.text) {
            Some(m) => match m.capture {
                Some(object) => Shape::Existing(object),
                None if self.patterns.widget_middleware_alone.is_match(anchor.text) => {
                    Shape::Alone
                }
                None => Shape::Untouched,
            },
            None => Shape::Wrap,
        };
        tracing::debug!(line = anchor.index, ?shape, "widget factory");

        match shape {
            Shape::Existing(object) => {
                let updated = object.splice(anchor.text, &append_to_object(object.text, &name));
                self.replace_line(&anchor, updated);
            }
            Shape::Alone => self.insert_entry(&anchor),
            Shape::Wrap => {
                let closed = self.patterns.widget_factory_close.replace_first(
                    anchor.text,
                    &format!(", middleware: {{ {name} }} }})"),
                );
                let updated = match closed {
                    Some(updated) => updated,
                    None => anchor
                        .text
                        .replacen("()", &format!("({{ middleware: {{ {name} }} }})"), 1),
                };
                self.replace_line(&anchor, updated);
            }
            Shape::Untouched => {}
        }

        let capability = self.capability;
        if let Some(follow_up) = &capability.follow_up {
            let line = format!("{}{follow_up}", self.tab);
            self.insert_after(&anchor, &line);
        }
    }
}

/// `{ a, b }` + `c` -> `{ a, b, c }`; an empty `{}` becomes `{ c }`.
fn append_to_object(object: &str, name: &str) -> String {
    let inner = object
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(object);
    if inner.trim().is_empty() {
        return format!("{{ {name} }}");
    }
    format!("{{{}, {name} }}", inner.trim_end_matches(' '))
}
