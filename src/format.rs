//! Indentation and line-ending selection for inserted text.

use crate::document::{Document, LineEnding};

/// Editor formatting options supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattingOptions {
    pub tab_size: usize,
    pub insert_spaces: bool,
    /// Forces the terminator of inserted lines; the document's own style
    /// is used when unset
    pub line_ending: Option<LineEnding>,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            tab_size: 4,
            insert_spaces: false,
            line_ending: None,
        }
    }
}

impl FormattingOptions {
    /// The indentation unit: a tab, or `tab_size` spaces.
    pub fn tab(&self) -> String {
        if self.insert_spaces {
            " ".repeat(self.tab_size)
        } else {
            "\t".to_string()
        }
    }

    /// Terminator for lines inserted into `document`.
    pub fn eol(&self, document: &Document) -> &'static str {
        self.line_ending
            .unwrap_or_else(|| document.line_ending())
            .as_str()
    }
}

/// Nesting depth for a line inserted below `line`: the number of leading
/// `tab` units on `line`, plus one.
pub fn tab_count(line: &str, tab: &str) -> usize {
    if tab.is_empty() {
        return 1;
    }
    let mut rest = line;
    let mut count = 0;
    while let Some(stripped) = rest.strip_prefix(tab) {
        rest = stripped;
        count += 1;
    }
    count + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_unit() {
        let tabs = FormattingOptions::default();
        assert_eq!(tabs.tab(), "\t");

        let spaces = FormattingOptions {
            tab_size: 2,
            insert_spaces: true,
            line_ending: None,
        };
        assert_eq!(spaces.tab(), "  ");
    }

    #[test]
    fn test_tab_count_counts_contiguous_prefix() {
        assert_eq!(tab_count("const factory = create({", "\t"), 1);
        assert_eq!(tab_count("\tmiddleware: {", "\t"), 2);
        assert_eq!(tab_count("\t\tx\t\t", "\t"), 3);
        assert_eq!(tab_count("    middleware: {", "  "), 3);
        assert_eq!(tab_count("   x", "  "), 2);
    }

    #[test]
    fn test_tab_count_empty_unit() {
        assert_eq!(tab_count("\tx", ""), 1);
    }

    #[test]
    fn test_eol_follows_document_unless_forced() {
        let crlf = Document::new("a.ts", "a\r\nb\r\n");
        let options = FormattingOptions::default();
        assert_eq!(options.eol(&crlf), "\r\n");

        let forced = FormattingOptions {
            line_ending: Some(LineEnding::Lf),
            ..FormattingOptions::default()
        };
        assert_eq!(forced.eol(&crlf), "\n");
    }
}
