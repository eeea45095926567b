//! Comment extraction from Go source using CST.
//!
//! Tree-sitter captures comments as explicit nodes, making extraction reliable.

use super::parser::{CstNode, CstTree};

/// A comment extracted from source code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// The comment text (including the `//` or `/*` prefix)
    pub text: String,
    /// Start byte offset
    pub start_byte: usize,
    /// End byte offset
    pub end_byte: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Whether this comment is inline (after code on same line)
    pub is_inline: bool,
}

impl Comment {
    /// Check if this comment is immediately before the given byte position:
    /// only whitespace in between and no blank line.
    #[must_use]
    pub fn is_attached_before(&self, byte_pos: usize, source: &str) -> bool {
        if self.end_byte > byte_pos {
            return false;
        }

        let between = &source[self.end_byte..byte_pos];
        between.chars().all(char::is_whitespace) && between.matches('\n').count() <= 1
    }
}

/// Extract all comments from a CST tree
#[must_use]
pub fn extract_comments(tree: &CstTree) -> Vec<Comment> {
    let mut comments = Vec::new();
    extract_comments_recursive(&tree.root, &tree.source, &mut comments);
    comments
}

fn extract_comments_recursive(node: &CstNode, source: &str, comments: &mut Vec<Comment>) {
    if node.kind == "comment" {
        let line_start = source[..node.start_byte]
            .rfind('\n')
            .map_or(0, |pos| pos + 1);
        let before_comment = &source[line_start..node.start_byte];
        let is_inline = before_comment.chars().any(|c| !c.is_whitespace());

        comments.push(Comment {
            text: node.text(source).to_owned(),
            start_byte: node.start_byte,
            end_byte: node.end_byte,
            line: node.start_point.row + 1,
            is_inline,
        });
    }

    for child in &node.children {
        extract_comments_recursive(child, source, comments);
    }
}

/// Start of the doc comment block attached to a declaration starting at
/// `decl_start`, or `decl_start` itself when there is none.
///
/// Only whole-line comments count, and the block must touch the declaration
/// without an empty line in between, which is how `go doc` associates them.
#[must_use]
pub fn doc_comment_start(comments: &[Comment], decl_start: usize, source: &str) -> usize {
    let mut start = decl_start;
    for comment in comments.iter().rev() {
        if comment.start_byte >= start {
            continue;
        }
        if !comment.is_inline && comment.is_attached_before(start, source) {
            start = comment.start_byte;
        } else {
            break;
        }
    }
    start
}
