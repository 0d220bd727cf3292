//! Immutable line-addressable snapshot of a source file.
//!
//! Every extent is a byte range into the document text. A line exposes two
//! extents: `range` stops before the line terminator, `range_including_line_break`
//! runs past it. Edits computed against a snapshot are addressed by these
//! extents and never by line numbers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Half-open byte range `[start, end)` into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Line terminator style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Detect the style of the first terminator in `text`, if any.
    pub fn detect(text: &str) -> Option<Self> {
        let pos = text.find('\n')?;
        if pos > 0 && text.as_bytes()[pos - 1] == b'\r' {
            Some(LineEnding::CrLf)
        } else {
            Some(LineEnding::Lf)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineSpan {
    start: usize,
    text_end: usize,
    full_end: usize,
}

/// A borrowed view of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Zero-based line number
    pub index: usize,
    /// Line text without its terminator
    pub text: &'a str,
    /// Extent of `text`
    pub range: TextRange,
    /// Extent of `text` plus its terminator
    pub range_including_line_break: TextRange,
}

impl Line<'_> {
    /// Whether the line is followed by a terminator.
    pub fn has_line_break(&self) -> bool {
        self.range_including_line_break.end > self.range.end
    }
}

/// Source file snapshot.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    text: String,
    lines: Vec<LineSpan>,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = split_lines(&text);
        Self {
            path: path.into(),
            text,
            lines,
        }
    }

    /// Read a document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Ok(Self::new(path, text))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<Line<'_>> {
        let span = self.lines.get(index)?;
        Some(Line {
            index,
            text: &self.text[span.start..span.text_end],
            range: TextRange::new(span.start, span.text_end),
            range_including_line_break: TextRange::new(span.start, span.full_end),
        })
    }

    pub fn lines(&self) -> impl DoubleEndedIterator<Item = Line<'_>> + '_ {
        (0..self.lines.len()).filter_map(move |index| self.line(index))
    }

    /// Line ending used by the document, `Lf` if it has no terminators.
    pub fn line_ending(&self) -> LineEnding {
        LineEnding::detect(&self.text).unwrap_or_default()
    }

    /// File name without its final extension (`Foo.tsx` -> `Foo`).
    pub fn file_stem(&self) -> Option<&str> {
        self.path.file_stem().and_then(|s| s.to_str())
    }

    /// Directory containing the document.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

fn split_lines(text: &str) -> Vec<LineSpan> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;

    for (pos, byte) in bytes.iter().enumerate() {
        if *byte != b'\n' {
            continue;
        }
        let text_end = if pos > start && bytes[pos - 1] == b'\r' {
            pos - 1
        } else {
            pos
        };
        lines.push(LineSpan {
            start,
            text_end,
            full_end: pos + 1,
        });
        start = pos + 1;
    }

    // Trailing line; empty when the text ends with a terminator
    lines.push(LineSpan {
        start,
        text_end: text.len(),
        full_end: text.len(),
    });

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lf_lines() {
        let doc = Document::new("a.ts", "one\ntwo\n");
        assert_eq!(doc.line_count(), 3);

        let first = doc.line(0).unwrap();
        assert_eq!(first.text, "one");
        assert_eq!(first.range, TextRange::new(0, 3));
        assert_eq!(first.range_including_line_break, TextRange::new(0, 4));

        let last = doc.line(2).unwrap();
        assert_eq!(last.text, "");
        assert!(!last.has_line_break());
    }

    #[test]
    fn test_split_crlf_lines() {
        let doc = Document::new("a.ts", "one\r\ntwo");
        let first = doc.line(0).unwrap();
        assert_eq!(first.text, "one");
        assert_eq!(first.range.end, 3);
        assert_eq!(first.range_including_line_break.end, 5);

        let second = doc.line(1).unwrap();
        assert_eq!(second.text, "two");
        assert_eq!(second.range, TextRange::new(5, 8));
        assert_eq!(doc.line_ending(), LineEnding::CrLf);
    }

    #[test]
    fn test_empty_document_has_one_line() {
        let doc = Document::new("a.ts", "");
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.line(0).unwrap().text, "");
        assert_eq!(doc.line_ending(), LineEnding::Lf);
    }

    #[test]
    fn test_file_stem_and_dir() {
        let doc = Document::new("src/widgets/Hello.tsx", "");
        assert_eq!(doc.file_stem(), Some("Hello"));
        assert_eq!(doc.dir(), Path::new("src/widgets"));
    }

    #[test]
    fn test_lines_reverse_iteration() {
        let doc = Document::new("a.ts", "a\nb\nc");
        let texts: Vec<_> = doc.lines().rev().map(|l| l.text).collect();
        assert_eq!(texts, vec!["c", "b", "a"]);
    }
}
