use crate::document::TextRange;
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Kind of a staged edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Insert,
    Replace,
}

/// One staged text edit, addressed against the pre-edit snapshot.
///
/// Inserts are empty spans. Replacements carry the text they expect to
/// overwrite so a batch can be rejected if the file changed underneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub kind: EditKind,
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// Text written at [byte_start, byte_end)
    pub new_text: String,
    /// What we expect to find at the span before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for edit safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (faster for large spans)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("before-text verification failed at [{byte_start}, {byte_end}): found {found:?}")]
    BeforeTextMismatch {
        byte_start: usize,
        byte_end: usize,
        found: String,
    },

    #[error("invalid byte range: [{byte_start}, {byte_end}) in text of length {len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        len: usize,
    },

    #[error("overlapping edits at [{first_start}, {first_end}) and [{second_start}, {second_end})")]
    Overlap {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Edit {
    pub fn insert(position: usize, text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Insert,
            byte_start: position,
            byte_end: position,
            new_text: text.into(),
            expected_before: EditVerification::ExactMatch(String::new()),
        }
    }

    pub fn replace(range: TextRange, before: &str, text: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Replace,
            byte_start: range.start,
            byte_end: range.end,
            new_text: text.into(),
            expected_before: EditVerification::from_text(before),
        }
    }

    /// Validate the edit against the snapshot contents.
    fn validate(&self, content: &str) -> Result<(), EditError> {
        let invalid = || EditError::InvalidByteRange {
            byte_start: self.byte_start,
            byte_end: self.byte_end,
            len: content.len(),
        };

        if self.byte_start > self.byte_end || self.byte_end > content.len() {
            return Err(invalid());
        }
        if !content.is_char_boundary(self.byte_start) || !content.is_char_boundary(self.byte_end)
        {
            return Err(invalid());
        }

        let current = &content[self.byte_start..self.byte_end];
        if !self.expected_before.matches(current) {
            return Err(EditError::BeforeTextMismatch {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                found: current.to_string(),
            });
        }

        Ok(())
    }
}

/// Ordered batch of edits computed for one invocation.
///
/// Ops are recorded in insertion order. Application orders them by position;
/// ops at the same position keep their insertion order, and an insert at the
/// start of a replaced span lands before the replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "EditBatch does nothing until applied"]
pub struct EditBatch {
    edits: Vec<Edit>,
}

impl EditBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, position: usize, text: impl Into<String>) {
        self.edits.push(Edit::insert(position, text));
    }

    pub fn replace(&mut self, range: TextRange, before: &str, text: impl Into<String>) {
        self.edits.push(Edit::replace(range, before, text));
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edit> {
        self.edits.iter()
    }

    /// Edits ordered by position, after checking that none overlap.
    fn ordered(&self) -> Result<Vec<&Edit>, EditError> {
        let mut ordered: Vec<&Edit> = self.edits.iter().collect();
        // Stable: equal positions keep insertion order
        ordered.sort_by(|a, b| {
            a.byte_start
                .cmp(&b.byte_start)
                .then(a.byte_end.cmp(&b.byte_end))
        });

        for window in ordered.windows(2) {
            let (first, second) = (window[0], window[1]);
            if first.byte_end > second.byte_start {
                return Err(EditError::Overlap {
                    first_start: first.byte_start,
                    first_end: first.byte_end,
                    second_start: second.byte_start,
                    second_end: second.byte_end,
                });
            }
        }

        Ok(ordered)
    }

    /// Apply every edit to `content` as one operation.
    ///
    /// All ops are validated against `content` before any is applied.
    pub fn apply_to_str(&self, content: &str) -> Result<String, EditError> {
        let ordered = self.ordered()?;
        for edit in &ordered {
            edit.validate(content)?;
        }

        let added: usize = ordered.iter().map(|e| e.new_text.len()).sum();
        let mut out = String::with_capacity(content.len() + added);
        let mut cursor = 0;
        for edit in ordered {
            out.push_str(&content[cursor..edit.byte_start]);
            out.push_str(&edit.new_text);
            cursor = edit.byte_end;
        }
        out.push_str(&content[cursor..]);

        Ok(out)
    }

    /// Apply the batch to a file on disk atomically.
    ///
    /// The file is re-read and every op verified against it, so a file that
    /// changed since the snapshot was taken is left untouched. Returns the
    /// new contents.
    pub fn apply_to_file(&self, path: &Path) -> Result<String, EditError> {
        let original = fs::read_to_string(path)?;
        let updated = self.apply_to_str(&original)?;
        if updated == original {
            return Ok(updated);
        }

        atomic_write(path, updated.as_bytes())?;

        // Update mtime so file watchers pick up the change
        let now = filetime::FileTime::now();
        filetime::set_file_mtime(path, now)?;

        Ok(updated)
    }
}

impl<'a> IntoIterator for &'a EditBatch {
    type Item = &'a Edit;
    type IntoIter = std::slice::Iter<'a, Edit>;

    fn into_iter(self) -> Self::IntoIter {
        self.edits.iter()
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// This ensures crash safety - either the full write succeeds or nothing changes.
pub(crate) fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Create tempfile in same directory to ensure same filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_verification_exact_match() {
        let text = "hello world";
        let verify = EditVerification::ExactMatch(text.to_string());
        assert!(verify.matches(text));
        assert!(!verify.matches("hello"));
    }

    #[test]
    fn test_edit_verification_hash() {
        let text = "x".repeat(2000);
        let verify = EditVerification::from_text(&text);
        assert!(matches!(verify, EditVerification::Hash(_)));
        assert!(verify.matches(&text));
        assert!(!verify.matches("y"));
    }

    #[test]
    fn test_apply_insert_and_replace() {
        let content = "line1\nline2\nline3\n";
        let mut batch = EditBatch::new();
        batch.replace(TextRange::new(6, 11), "line2", "LINE2");
        batch.insert(12, "inserted\n");

        let out = batch.apply_to_str(content).unwrap();
        assert_eq!(out, "line1\nLINE2\ninserted\nline3\n");
    }

    #[test]
    fn test_insert_at_replace_start_lands_before_replacement() {
        let content = "create();\n";
        let mut batch = EditBatch::new();
        batch.replace(TextRange::new(0, 9), "create();", "create({ store });");
        batch.insert(0, "const store = createStoreMiddleware();\n");

        let out = batch.apply_to_str(content).unwrap();
        assert_eq!(
            out,
            "const store = createStoreMiddleware();\ncreate({ store });\n"
        );
    }

    #[test]
    fn test_same_position_inserts_keep_order() {
        let mut batch = EditBatch::new();
        batch.insert(2, "first;");
        batch.insert(2, "second;");
        assert_eq!(batch.apply_to_str("a\nb").unwrap(), "a\nfirst;second;b");
    }

    #[test]
    fn test_overlap_rejected() {
        let mut batch = EditBatch::new();
        batch.replace(TextRange::new(0, 5), "hello", "HELLO");
        batch.insert(3, "x");
        let result = batch.apply_to_str("hello world");
        assert!(matches!(result, Err(EditError::Overlap { .. })));
    }

    #[test]
    fn test_before_text_mismatch() {
        let mut batch = EditBatch::new();
        batch.replace(TextRange::new(0, 5), "hello", "HELLO");
        let result = batch.apply_to_str("jello world");
        assert!(matches!(result, Err(EditError::BeforeTextMismatch { .. })));
    }

    #[test]
    fn test_invalid_range() {
        let mut batch = EditBatch::new();
        batch.insert(50, "x");
        let result = batch.apply_to_str("short");
        assert!(matches!(result, Err(EditError::InvalidByteRange { .. })));
    }

    #[test]
    fn test_non_char_boundary_rejected() {
        let mut batch = EditBatch::new();
        batch.insert(1, "x");
        let result = batch.apply_to_str("é");
        assert!(matches!(result, Err(EditError::InvalidByteRange { .. })));
    }

    #[test]
    fn test_apply_to_file_atomic() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("Hello.tsx");
        fs::write(&file_path, "original content").unwrap();

        let mut batch = EditBatch::new();
        batch.replace(TextRange::new(0, 8), "original", "modified");
        let updated = batch.apply_to_file(&file_path).unwrap();

        assert_eq!(updated, "modified content");
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "modified content");
    }

    #[test]
    fn test_apply_to_file_leaves_changed_file_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("Hello.tsx");
        fs::write(&file_path, "changed content").unwrap();

        let mut batch = EditBatch::new();
        batch.replace(TextRange::new(0, 8), "original", "modified");
        assert!(batch.apply_to_file(&file_path).is_err());
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "changed content");
    }
}
