//! The slicing engine.
//!
//! - [`RangePruner`]: deletes what the coverage report proves never ran
//! - [`DeclarationFixer`]: renames unused bindings to `_` in place
//! - [`DeadObjectPruner`]: deletes declarations the oracle reports unused
//!
//! Every pass reads one freshly parsed file and returns byte edits for
//! [`crate::fix::ByteRangeRewriter`]; none of them touches the disk.

mod decl_fixer;
mod object_pruner;
mod range_pruner;
mod scope;

pub use decl_fixer::DeclarationFixer;
pub use object_pruner::DeadObjectPruner;
pub use range_pruner::{is_terminating, PruneOutcome, RangePruner};
pub use scope::Bindings;

use crate::fix::Edit;

/// Outcome of pruning one node.
#[derive(Debug)]
pub(crate) enum Pruned {
    /// The node and everything below it goes away.
    Removed,
    /// The node stays, rewritten by these edits (possibly none).
    Kept(Vec<Edit>),
}
