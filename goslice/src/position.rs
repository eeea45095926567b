//! Line/column to byte-offset conversion for coverage positions.
//!
//! Coverage tooling reports 1-based `(line, column)` pairs where columns
//! count bytes and reset after every `\n`. The pruner works on byte offsets,
//! so every range is converted once per file through a [`PositionIndex`].

use std::fmt;

use crate::coverage::SourceRange;

/// A coverage position or range that does not fit the buffer it was
/// looked up in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// The position lies outside the buffer.
    #[error("position {line}:{column} is outside the source buffer ({len} bytes, {lines} lines)")]
    OutOfBuffer {
        /// Requested 1-based line.
        line: usize,
        /// Requested 1-based column.
        column: usize,
        /// Length of the buffer in bytes.
        len: usize,
        /// Number of lines in the buffer.
        lines: usize,
    },
    /// The range ends before it starts.
    #[error("range {range} ends before it starts")]
    Inverted {
        /// The offending range.
        range: SourceRange,
    },
}

/// Precomputed line starts of one source buffer.
#[derive(Debug, Clone)]
pub struct PositionIndex {
    /// Byte index of the first byte of each line.
    line_starts: Vec<usize>,
    /// Total buffer length.
    len: usize,
}

impl PositionIndex {
    /// Scans the buffer once for line terminators.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in source.as_bytes().iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Converts a 1-based `(line, column)` pair to a byte offset.
    ///
    /// The column may point one past the last byte of its line, which is
    /// how exclusive range ends are expressed.
    pub fn offset(&self, line: usize, column: usize) -> Result<usize, PositionError> {
        let err = || PositionError::OutOfBuffer {
            line,
            column,
            len: self.len,
            lines: self.line_starts.len(),
        };
        if line == 0 || column == 0 || line > self.line_starts.len() {
            return Err(err());
        }
        let start = self.line_starts[line - 1];
        // End of this line, excluding its terminator.
        let line_end = self
            .line_starts
            .get(line)
            .map_or(self.len, |next| next - 1);
        let offset = start + column - 1;
        if offset > line_end {
            return Err(err());
        }
        Ok(offset)
    }

    /// Inverse of [`PositionIndex::offset`]: 1-based `(line, column)` of a byte offset.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    /// Converts a coverage range into a byte range of this buffer.
    pub fn byte_range(&self, range: &SourceRange) -> Result<ByteRange, PositionError> {
        let start = self.offset(range.start_line, range.start_col)?;
        let end = self.offset(range.end_line, range.end_col)?;
        if end < start {
            return Err(PositionError::Inverted { range: *range });
        }
        Ok(ByteRange::new(start, end))
    }
}

/// A half-open byte span `[start, end)` of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteRange {
    /// First byte of the range.
    pub start: usize,
    /// One past the last byte of the range.
    pub end: usize,
}

impl ByteRange {
    /// Creates a range; `start` must not exceed `end`.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Full containment: the node span lies entirely inside this range.
    #[must_use]
    pub const fn contains(&self, start: usize, end: usize) -> bool {
        start >= self.start && end <= self.end
    }

    /// Whether the byte offset falls inside the range.
    #[must_use]
    pub const fn contains_offset(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{},{}", self.start, self.end)
    }
}
