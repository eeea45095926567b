//! Parsing of the zero-count coverage report.
//!
//! The report is a sequence of blocks. A block opens with a line naming a
//! source file and continues with one `#<line0>:<col0>,<line1>:<col1>` line
//! per region that never executed:
//!
//! ```text
//! slicer/P/P.go
//! #12:20,14:3
//! #20:2,20:14
//! slicer/P/util.go
//! ```

use std::fmt;
use std::io::BufRead;
use std::path::PathBuf;

use crate::constants::get_range_line_re;
use crate::error::SliceError;

/// A region with zero execution count, 1-based and half-open in columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    /// First line of the region.
    pub start_line: usize,
    /// First column of the region.
    pub start_col: usize,
    /// Last line of the region.
    pub end_line: usize,
    /// Column one past the end of the region.
    pub end_col: usize,
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{}:{}",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}

/// The uncovered ranges of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCoverage {
    /// Path as written in the report (import-relative or absolute).
    pub path: PathBuf,
    /// Uncovered ranges in report order.
    pub uncovered: Vec<SourceRange>,
}

/// A parsed coverage report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    /// Per-file blocks in report order.
    pub files: Vec<FileCoverage>,
}

impl CoverageReport {
    /// Parses a report from any buffered reader.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, SliceError> {
        let re = get_range_line_re();
        let mut files: Vec<FileCoverage> = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line_number = idx + 1;
            let line = line.map_err(|source| SliceError::Io {
                path: PathBuf::from("<coverage report>"),
                source,
            })?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            if !line.starts_with('#') {
                files.push(FileCoverage {
                    path: PathBuf::from(line),
                    uncovered: Vec::new(),
                });
                continue;
            }

            let malformed = || SliceError::MalformedReport {
                line_number,
                line: line.to_owned(),
            };
            let caps = re.captures(line).ok_or_else(malformed)?;
            let field = |i: usize| -> Result<usize, SliceError> {
                caps[i].parse::<usize>().map_err(|_| malformed())
            };
            let range = SourceRange {
                start_line: field(1)?,
                start_col: field(2)?,
                end_line: field(3)?,
                end_col: field(4)?,
            };
            let current = files.last_mut().ok_or_else(malformed)?;
            current.uncovered.push(range);
        }

        Ok(Self { files })
    }

    /// Parses a report held in memory.
    pub fn parse_str(text: &str) -> Result<Self, SliceError> {
        Self::parse(text.as_bytes())
    }

    /// Total number of uncovered ranges across all files.
    #[must_use]
    pub fn range_count(&self) -> usize {
        self.files.iter().map(|f| f.uncovered.len()).sum()
    }
}
