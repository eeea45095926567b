//! Removal spans: how much text goes away when a node is deleted.
//!
//! - **Whole lines when alone**: a node that is the only thing on its lines
//!   takes its indentation and line break with it
//! - **Doc comments belong to declarations**: attached comment lines go too
//! - **No double blank lines**: a top-level removal between two blank lines
//!   also consumes one of them

use super::comments::{doc_comment_start, Comment};
use super::parser::CstNode;

fn is_inline_space(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r'
}

/// Expands `[start, end)` to whole lines when nothing else shares them.
#[must_use]
pub fn line_span(source: &str, start: usize, end: usize) -> (usize, usize) {
    let line_start = source[..start].rfind('\n').map_or(0, |p| p + 1);
    let line_end = source[end..].find('\n').map_or(source.len(), |p| end + p);

    let prefix_blank = source[line_start..start].chars().all(is_inline_space);
    let suffix_blank = source[end..line_end]
        .chars()
        .all(|c| is_inline_space(c) || c == ';');

    if prefix_blank && suffix_blank {
        let stop = if line_end < source.len() {
            line_end + 1
        } else {
            line_end
        };
        (line_start, stop)
    } else {
        (start, end)
    }
}

/// Removal span of a statement or spec nested inside another construct.
#[must_use]
pub fn node_span(source: &str, node: &CstNode) -> (usize, usize) {
    line_span(source, node.start_byte, node.end_byte)
}

/// Removal span of a top-level declaration, including its doc comment.
#[must_use]
pub fn declaration_span(source: &str, comments: &[Comment], node: &CstNode) -> (usize, usize) {
    let start = doc_comment_start(comments, node.start_byte, source);
    let (start, end) = line_span(source, start, node.end_byte);

    let preceded_by_blank = start >= 1 && (start == 1 || source[..start - 1].ends_with('\n'));
    let followed_by_blank = source[end..].starts_with('\n');
    if start == line_start_of(source, start) && preceded_by_blank && followed_by_blank {
        return (start, end + 1);
    }
    (start, end)
}

fn line_start_of(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map_or(0, |p| p + 1)
}
