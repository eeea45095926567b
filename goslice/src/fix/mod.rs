//! Byte-range edit infrastructure shared by every pruning stage.
//!
//! The pruners never mutate text directly. They describe their changes as
//! [`Edit`]s against the buffer their tree was parsed from, and the
//! [`ByteRangeRewriter`] applies them in one pass. Bytes outside an edit are
//! emitted unchanged, which keeps comments and formatting intact.

mod rewriter;

pub use rewriter::{ByteRangeRewriter, Edit, RewriteError};
