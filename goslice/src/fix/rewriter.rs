//! Byte-range safe code rewriter.
//!
//! # Usage
//!
//! ```
//! use goslice::fix::{ByteRangeRewriter, Edit};
//!
//! let source = "x := 1";
//! let mut rewriter = ByteRangeRewriter::new(source);
//! rewriter.add_edit(Edit::new(0, 1, "_"));
//! rewriter.add_edit(Edit::new(2, 4, "="));
//! assert_eq!(rewriter.apply().unwrap(), "_ = 1");
//! ```

use crate::cst::GoParser;

/// A single edit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Start byte offset (inclusive)
    pub start_byte: usize,
    /// End byte offset (exclusive)
    pub end_byte: usize,
    /// Replacement content
    pub replacement: String,
    /// Optional description for logging
    pub description: Option<String>,
}

impl Edit {
    /// Create a new edit
    #[must_use]
    pub fn new(start_byte: usize, end_byte: usize, replacement: impl Into<String>) -> Self {
        Self {
            start_byte,
            end_byte,
            replacement: replacement.into(),
            description: None,
        }
    }

    /// Create a deletion edit
    #[must_use]
    pub fn delete(start_byte: usize, end_byte: usize) -> Self {
        Self::new(start_byte, end_byte, "")
    }

    /// Create an insertion edit (insert before position)
    #[must_use]
    pub fn insert(position: usize, content: impl Into<String>) -> Self {
        Self::new(position, position, content)
    }

    /// Attach a description used in debug logs.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check if this edit overlaps with another
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }

    /// Whether applying this edit to `source` would leave it unchanged.
    #[must_use]
    pub fn is_noop(&self, source: &str) -> bool {
        source.get(self.start_byte..self.end_byte) == Some(self.replacement.as_str())
    }
}

/// Error during rewriting
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// Two or more edits have overlapping ranges
    #[error("overlapping edits at indices {edit_a} and {edit_b}")]
    OverlappingEdits {
        /// Index of first overlapping edit
        edit_a: usize,
        /// Index of second overlapping edit
        edit_b: usize,
    },
    /// Edit range is out of bounds or splits a UTF-8 sequence
    #[error("edit {edit_index} out of bounds: {start_byte}..{end_byte} in a source of {source_len} bytes")]
    OutOfBounds {
        /// Index of the bad edit
        edit_index: usize,
        /// Start byte of the edit
        start_byte: usize,
        /// End byte of the edit
        end_byte: usize,
        /// Length of the source
        source_len: usize,
    },
    /// The rewritten text no longer parses as Go
    #[error("rewritten source does not parse: {0}")]
    Unparsable(String),
}

/// Safe code rewriter using byte ranges
///
/// Edits are applied in reverse order to preserve byte positions, after
/// checking that none of them overlap.
#[derive(Debug, Clone)]
pub struct ByteRangeRewriter {
    /// Original source code
    source: String,
    /// Pending edits
    edits: Vec<Edit>,
}

impl ByteRangeRewriter {
    /// Create a new rewriter for the given source
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            edits: Vec::new(),
        }
    }

    /// Add an edit to the pending list
    pub fn add_edit(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Add multiple edits
    pub fn add_edits(&mut self, edits: impl IntoIterator<Item = Edit>) {
        self.edits.extend(edits);
    }

    /// Validate edits without applying them
    ///
    /// # Errors
    /// Returns error if edits overlap or are out of bounds
    pub fn validate(&self) -> Result<(), RewriteError> {
        for (i, edit) in self.edits.iter().enumerate() {
            let in_bounds = edit.start_byte <= edit.end_byte
                && edit.end_byte <= self.source.len()
                && self.source.is_char_boundary(edit.start_byte)
                && self.source.is_char_boundary(edit.end_byte);
            if !in_bounds {
                return Err(RewriteError::OutOfBounds {
                    edit_index: i,
                    start_byte: edit.start_byte,
                    end_byte: edit.end_byte,
                    source_len: self.source.len(),
                });
            }
        }

        for i in 0..self.edits.len() {
            for j in (i + 1)..self.edits.len() {
                if self.edits[i].overlaps(&self.edits[j]) {
                    return Err(RewriteError::OverlappingEdits {
                        edit_a: i,
                        edit_b: j,
                    });
                }
            }
        }

        Ok(())
    }

    /// Apply all edits and return the modified source
    ///
    /// Insertions at the same offset keep the order they were added in.
    ///
    /// # Errors
    /// Returns error if edits overlap or are out of bounds
    pub fn apply(self) -> Result<String, RewriteError> {
        self.validate()?;

        let mut result = self.source;
        let mut ordered: Vec<(usize, Edit)> = self.edits.into_iter().enumerate().collect();
        // Apply from the end of the buffer backwards.
        ordered.sort_by(|(ia, a), (ib, b)| {
            b.start_byte
                .cmp(&a.start_byte)
                .then_with(|| ib.cmp(ia))
        });

        for (_, edit) in ordered {
            if let Some(description) = &edit.description {
                tracing::trace!(
                    start = edit.start_byte,
                    end = edit.end_byte,
                    "{description}"
                );
            }
            result.replace_range(edit.start_byte..edit.end_byte, &edit.replacement);
        }

        Ok(result)
    }

    /// Apply edits and verify the result still parses as Go
    ///
    /// # Errors
    /// Returns error if edits are invalid or the result has syntax errors
    pub fn apply_verified(self) -> Result<String, RewriteError> {
        let result = self.apply()?;
        let mut parser = GoParser::new().map_err(|e| RewriteError::Unparsable(e.to_string()))?;
        let tree = parser
            .parse(&result)
            .map_err(|e| RewriteError::Unparsable(e.to_string()))?;
        if let Some(offset) = tree.first_error() {
            return Err(RewriteError::Unparsable(format!(
                "syntax error near byte {offset}"
            )));
        }
        Ok(result)
    }
}
