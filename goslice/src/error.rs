//! Error type shared by every stage of the slicing pipeline.
//!
//! Every variant is fatal to the run. Soft diagnostics are not errors; they
//! are consumed by the fixer loop and never reach this type.

use std::path::PathBuf;

use crate::fix::RewriteError;
use crate::oracle::DiagnosticSet;
use crate::position::PositionError;

/// Fatal pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum SliceError {
    /// A coverage report line is neither a file name nor a range.
    #[error("malformed coverage report at line {line_number}: {line:?}")]
    MalformedReport {
        /// 1-based report line.
        line_number: usize,
        /// The offending text.
        line: String,
    },
    /// A coverage position does not exist in the file it names.
    #[error("coverage report inconsistent with {}: {source}", .path.display())]
    Position {
        /// File the position was looked up in.
        path: PathBuf,
        /// Lookup failure.
        #[source]
        source: PositionError,
    },
    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// A source file does not parse as Go.
    #[error("cannot parse {} as Go: {reason}", .path.display())]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
    /// The computed edits could not be applied.
    #[error("rewriting {} failed: {source}", .path.display())]
    Rewrite {
        /// File being rewritten.
        path: PathBuf,
        /// Rewriter failure.
        #[source]
        source: RewriteError,
    },
    /// The oracle reported diagnostics other than unused declarations.
    #[error("static analysis reported {} error(s) that cannot be fixed automatically:\n{}", .0.hard_count(), .0)]
    HardDiagnostics(DiagnosticSet),
    /// The oracle could not be run or its output could not be read.
    #[error("unused-symbol oracle failed: {0}")]
    Oracle(String),
    /// A declaration shape the dead-object pruner cannot map.
    #[error("unrecognized {what} at {}:#{offset} (node kind `{kind}`)", .path.display())]
    UnrecognizedShape {
        /// File containing the declaration.
        path: PathBuf,
        /// What was being decoded (receiver, field).
        what: &'static str,
        /// Tree-sitter node kind found.
        kind: String,
        /// Byte offset of the node.
        offset: usize,
    },
    /// A report path is not under any configured source root.
    #[error("cannot resolve {} against the configured source roots", .0.display())]
    UnresolvedPath(PathBuf),
    /// The destination would overwrite the sources.
    #[error("destination {} overlaps source root {}", .destination.display(), .source_root.display())]
    DestinationOverlapsSource {
        /// Destination root.
        destination: PathBuf,
        /// Conflicting source root.
        source_root: PathBuf,
    },
    /// The fixer/oracle loop did not settle.
    #[error("no fixed point after {rounds} oracle round(s); {remaining} diagnostic(s) outstanding")]
    NoFixedPoint {
        /// Rounds spent.
        rounds: usize,
        /// Diagnostics still reported in the last round.
        remaining: usize,
    },
}

impl SliceError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
