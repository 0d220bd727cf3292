//! Line patterns for every syntactic shape the injector recognizes.
//!
//! Each pattern is matched against a single line of text. Matching is
//! stateless: a [`Pattern`] holds no scan cursor, so the same instance can be
//! reused for any number of lookups within one invocation.
//!
//! # Capture contract
//!
//! | pattern                      | group 1                                 |
//! |------------------------------|-----------------------------------------|
//! | `create-line`                | `{ ... }` argument object on the line    |
//! | `widget-factory-middleware`  | `{ ... }` object after `middleware:`     |
//!
//! All other patterns have no capture groups. A capture that is present but
//! empty is reported as absent. Captures carry their byte offsets within the
//! line so callers splice at the captured span rather than searching for its
//! text again.

use regex::{NoExpand, Regex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatternError {
    #[error("invalid pattern '{name}': {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// A captured group and where it sits in the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture<'t> {
    pub text: &'t str,
    /// Byte offsets within the line
    pub start: usize,
    pub end: usize,
}

impl Capture<'_> {
    /// `line` with the captured span replaced by `replacement`.
    pub fn splice(&self, line: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(line.len() + replacement.len());
        out.push_str(&line[..self.start]);
        out.push_str(replacement);
        out.push_str(&line[self.end..]);
        out
    }
}

/// Result of matching a pattern against one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch<'t> {
    /// First non-empty capture group
    pub capture: Option<Capture<'t>>,
}

/// A line matcher. The name only shows up in compile errors.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    pub fn new(name: &'static str, source: &str) -> Result<Self, PatternError> {
        let regex = Regex::new(source).map_err(|source| PatternError::Invalid { name, source })?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Match `text`, returning the first non-empty capture.
    pub fn find<'t>(&self, text: &'t str) -> Option<PatternMatch<'t>> {
        let caps = self.regex.captures(text)?;
        let capture = caps
            .iter()
            .skip(1)
            .flatten()
            .find(|m| !m.is_empty())
            .map(|m| Capture {
                text: m.as_str(),
                start: m.start(),
                end: m.end(),
            });
        Some(PatternMatch { capture })
    }

    /// Replace the first match in `text` with a literal replacement.
    ///
    /// Returns `None` when the pattern does not match.
    pub fn replace_first(&self, text: &str, replacement: &str) -> Option<String> {
        if !self.regex.is_match(text) {
            return None;
        }
        Some(self.regex.replacen(text, 1, NoExpand(replacement)).into_owned())
    }
}

/// The fixed set of patterns used by one injector.
#[derive(Debug, Clone)]
pub struct PatternSet {
    /// Line ending an import from `@dojo/framework/core/vdom`, either a
    /// single-line `import ... from` or the `} from` of a multi-line one
    pub vdom_import: Pattern,
    /// Any line that terminates an import statement
    pub import_line: Pattern,
    /// `create(` with an optional same-line `{ ... }` argument
    pub create_line: Pattern,
    /// `create({` at end of line
    pub create_alone: Pattern,
    /// `factory(function`
    pub widget_factory_start: Pattern,
    /// `)` followed by the render function body `{`
    pub widget_factory_end: Pattern,
    /// `middleware:` with an optional same-line `{ ... }` object
    pub widget_factory_middleware: Pattern,
    /// `middleware: {` at end of line
    pub widget_middleware_alone: Pattern,
    /// `}` closing the argument object followed by `)`
    pub widget_factory_close: Pattern,
}

impl PatternSet {
    pub fn compile() -> Result<Self, PatternError> {
        Ok(Self {
            vdom_import: Pattern::new(
                "vdom-import",
                r#"^(?:\s*import\s.*|.*\})\s*\bfrom\s+['"]@dojo/framework/core/vdom['"]"#,
            )?,
            import_line: Pattern::new(
                "import-line",
                r#"^\s*(?:import\s.*\bfrom\s+|\}\s*from\s+|import\s+)['"][^'"]+['"]\s*;?\s*$"#,
            )?,
            create_line: Pattern::new("create-line", r"\bcreate\((\{[^}]*\})?")?,
            create_alone: Pattern::new("create-alone", r"\bcreate\(\{\s*$")?,
            widget_factory_start: Pattern::new(
                "widget-factory-start",
                r"\bfactory\(\s*function\b",
            )?,
            widget_factory_end: Pattern::new(
                "widget-factory-end",
                r"\)\s*(?::\s*[\w.<>\[\]| ]+)?(?:=>\s*)?\{",
            )?,
            widget_factory_middleware: Pattern::new(
                "widget-factory-middleware",
                r"\bmiddleware\s*:\s*(\{[^}]*\})?",
            )?,
            widget_middleware_alone: Pattern::new(
                "widget-middleware-alone",
                r"\bmiddleware\s*:\s*\{\s*$",
            )?,
            widget_factory_close: Pattern::new("widget-factory-close", r"[ ]*\}[ ]*\)")?,
        })
    }
}
