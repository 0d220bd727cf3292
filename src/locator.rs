use crate::document::{Document, Line, TextRange};
use crate::patterns::{Capture, Pattern};

/// Scan constraints for [`find_line`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions<'p> {
    /// Scan from the end (or from `start_at` toward the beginning)
    pub reverse: bool,
    /// Line index the scan begins at, inclusive
    pub start_at: Option<usize>,
    /// A line matching this pattern ends the scan before the main pattern
    /// is tried on it
    pub end_test: Option<&'p Pattern>,
}

impl<'p> FindOptions<'p> {
    pub fn reverse() -> Self {
        Self {
            reverse: true,
            ..Self::default()
        }
    }

    /// Forward scan from `start_at` that stops at the first `end_test` line.
    pub fn bounded(start_at: usize, end_test: &'p Pattern) -> Self {
        Self {
            reverse: false,
            start_at: Some(start_at),
            end_test: Some(end_test),
        }
    }
}

/// A line that satisfied a locate operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMatch<'d> {
    pub index: usize,
    pub text: &'d str,
    pub range: TextRange,
    pub range_including_line_break: TextRange,
    /// First non-empty capture group of the pattern, if any, with offsets
    /// relative to the line
    pub capture: Option<Capture<'d>>,
}

impl<'d> LineMatch<'d> {
    fn new(line: Line<'d>, capture: Option<Capture<'d>>) -> Self {
        Self {
            index: line.index,
            text: line.text,
            range: line.range,
            range_including_line_break: line.range_including_line_break,
            capture,
        }
    }

    /// Whether the matched line is followed by a terminator.
    pub fn has_line_break(&self) -> bool {
        self.range_including_line_break.end > self.range.end
    }
}

/// Find the first line matching `pattern` in scan order.
///
/// Returns `None` when no line qualifies. Callers treat that as "construct
/// not present" and skip the dependent edit.
pub fn find_line<'d>(
    document: &'d Document,
    pattern: &Pattern,
    options: FindOptions<'_>,
) -> Option<LineMatch<'d>> {
    let count = document.line_count();
    if count == 0 {
        return None;
    }

    let indices: Box<dyn Iterator<Item = usize>> = match (options.reverse, options.start_at) {
        (false, None) => Box::new(0..count),
        (false, Some(start)) => Box::new(start.min(count)..count),
        (true, None) => Box::new((0..count).rev()),
        (true, Some(start)) => Box::new((0..=start.min(count - 1)).rev()),
    };

    for index in indices {
        let line = document.line(index)?;
        if options.end_test.is_some_and(|end| end.is_match(line.text)) {
            return None;
        }
        if let Some(m) = pattern.find(line.text) {
            return Some(LineMatch::new(line, m.capture));
        }
    }

    None
}
