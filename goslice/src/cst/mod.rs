//! CST (Concrete Syntax Tree) module for Go sources.
//!
//! This module provides Tree-sitter based CST parsing for:
//! - Exact byte ranges of statements, declarations and tokens
//! - Doc comment association when declarations are deleted
//! - Removal spans that keep the surrounding formatting intact
//!
//! # Design Principles
//!
//! - **Parse per pass**: every stage re-parses the current text of a file
//! - **Tree decides, bytes cut**: pruners read the tree and emit byte edits
//! - **Byte-range anchored**: coverage and oracle positions are byte offsets

mod comments;
mod parser;
mod span;

pub use comments::{doc_comment_start, extract_comments, Comment};
pub use parser::{CstError, CstNode, CstTree, GoParser, Point};
pub use span::{declaration_span, line_span, node_span};

/// Statements of a `block` or case clause, in order.
///
/// Newer grammars wrap them in a `statement_list` node; older ones do not.
/// Comments and empty statements are skipped.
#[must_use]
pub fn statements(container: &CstNode) -> Vec<&CstNode> {
    let mut out = Vec::new();
    collect_statements(container, &mut out);
    out
}

fn collect_statements<'a>(container: &'a CstNode, out: &mut Vec<&'a CstNode>) {
    for child in container.named_children() {
        match child.kind {
            "statement_list" => collect_statements(child, out),
            "comment" | "empty_statement" => {}
            // Case value/type expressions are fields, not statements.
            _ if child.field.is_some() => {}
            _ => out.push(child),
        }
    }
}
