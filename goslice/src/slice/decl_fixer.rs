//! Neutralization of "declared and not used" style diagnostics.
//!
//! Flagged bindings are renamed to `_` rather than deleted, so the
//! right-hand side of their declaration keeps its side effects. Every
//! identifier resolving to a blanked declaration is blanked with it, and a
//! `:=` whose targets are all `_` becomes `=`. Updates that cannot apply to
//! `_` are rewritten: `x++` goes away, `x += e` becomes `_ = e`. Unused
//! labels are stripped from their statements.

use rustc_hash::FxHashSet;

use super::scope::Bindings;
use crate::constants::DISCARD_IDENT;
use crate::cst::{line_span, node_span, CstNode, CstTree};
use crate::fix::Edit;

/// Node kinds whose `:=` token may be downgraded to `=`.
const DECLARING_ASSIGNMENTS: &[&str] =
    &["short_var_declaration", "range_clause", "receive_statement"];

/// Statements that update a variable in place and have no `_` form.
const INCREMENTS: &[&str] = &["inc_statement", "dec_statement"];

/// Plans identifier and token substitutions for one file.
pub struct DeclarationFixer<'a> {
    tree: &'a CstTree,
    bindings: Bindings,
}

impl<'a> DeclarationFixer<'a> {
    /// Resolves the file's scopes up front.
    #[must_use]
    pub fn new(tree: &'a CstTree) -> Self {
        Self {
            tree,
            bindings: Bindings::resolve(tree),
        }
    }

    /// Edits that clear the soft diagnostics reported at `offsets`.
    ///
    /// Edits that would not change the text are dropped, so fixing an
    /// already fixed file yields nothing.
    #[must_use]
    pub fn fix(&self, offsets: &[usize]) -> Vec<Edit> {
        let source = self.tree.source.as_str();
        let flagged: FxHashSet<usize> = offsets.iter().copied().collect();
        let identifiers = self.tree.root.find_by_kind("identifier");

        let dead_decls: FxHashSet<usize> = identifiers
            .iter()
            .filter(|id| flagged.contains(&id.start_byte))
            .map(|id| {
                self.bindings
                    .declaration_of(id.start_byte)
                    .unwrap_or(id.start_byte)
            })
            .collect();

        let blanked: FxHashSet<usize> = identifiers
            .iter()
            .filter(|id| {
                flagged.contains(&id.start_byte)
                    || self
                        .bindings
                        .declaration_of(id.start_byte)
                        .is_some_and(|d| dead_decls.contains(&d))
            })
            .map(|id| id.start_byte)
            .collect();

        let mut dropped: Vec<(usize, usize)> = Vec::new();
        for kind in INCREMENTS {
            for stmt in self.tree.root.find_by_kind(kind) {
                let operand = stmt.named_children().next();
                if operand.is_some_and(|o| o.kind == "identifier" && blanked.contains(&o.start_byte)) {
                    tracing::debug!(kind = stmt.kind, at = stmt.start_byte, "removing update of blanked variable");
                    dropped.push(node_span(source, stmt));
                }
            }
        }
        let mut edits: Vec<Edit> = dropped
            .iter()
            .map(|&(start, end)| Edit::delete(start, end).describe("remove update of blank"))
            .collect();

        edits.extend(
            identifiers
                .iter()
                .filter(|id| blanked.contains(&id.start_byte))
                .filter(|id| !dropped.iter().any(|&(s, e)| (s..e).contains(&id.start_byte)))
                .map(|id| {
                    tracing::debug!(name = id.text(source), at = id.start_byte, "blanking binding");
                    Edit::new(id.start_byte, id.end_byte, DISCARD_IDENT).describe("blank binding")
                }),
        );

        for spec in self.tree.root.find_by_kind("import_spec") {
            if let Some(edit) = fix_import(spec, &flagged) {
                edits.push(edit);
            }
        }

        // Blanking is planned first so the downgrade sees the final targets.
        for kind in DECLARING_ASSIGNMENTS {
            for stmt in self.tree.root.find_by_kind(kind) {
                if let Some(edit) = downgrade(stmt, source, &flagged, &blanked) {
                    edits.push(edit);
                }
            }
        }

        for stmt in self.tree.root.find_by_kind("assignment_statement") {
            if let Some(edit) = plain_assignment(stmt, source, &blanked) {
                edits.push(edit);
            }
        }

        for kind in ["labeled_statement", "empty_labeled_statement"] {
            for stmt in self.tree.root.find_by_kind(kind) {
                if let Some(edit) = strip_label(stmt, source, &flagged) {
                    edits.push(edit);
                }
            }
        }

        edits.retain(|e| !e.is_noop(source));
        edits
    }
}

/// `x op= e` on a blanked `x` becomes `_ = e`, keeping `e` evaluated.
fn plain_assignment(stmt: &CstNode, source: &str, blanked: &FxHashSet<usize>) -> Option<Edit> {
    let operator = stmt.child_by_field("operator")?;
    if operator.text(source) == "=" {
        return None;
    }
    let left = stmt.child_by_field("left")?;
    let mut targets = left.named_children();
    let target = targets.next()?;
    if targets.next().is_some() || target.kind != "identifier" || !blanked.contains(&target.start_byte) {
        return None;
    }
    tracing::debug!(at = operator.start_byte, "dropping compound operator");
    Some(Edit::new(operator.start_byte, operator.end_byte, "=").describe("plain assignment to blank"))
}

/// Removes `L:` from a labeled statement whose label is flagged.
///
/// A label alone on its line takes the line with it; the labeled statement
/// keeps its own indentation.
fn strip_label(stmt: &CstNode, source: &str, flagged: &FxHashSet<usize>) -> Option<Edit> {
    let label = stmt.child_by_field("label")?;
    if !flagged.contains(&label.start_byte) && !flagged.contains(&stmt.start_byte) {
        return None;
    }
    let colon = stmt.child_of_kind(":")?;
    let inner = stmt
        .named_children()
        .find(|c| c.field.is_none() && c.kind != "comment");
    let (start, end) = match inner {
        Some(inner) if source[colon.end_byte..inner.start_byte].contains('\n') => {
            line_span(source, label.start_byte, colon.end_byte)
        }
        Some(inner) => (label.start_byte, inner.start_byte),
        None => line_span(source, label.start_byte, colon.end_byte),
    };
    tracing::debug!(label = label.text(source), at = label.start_byte, "stripping unused label");
    Some(Edit::delete(start, end).describe("strip unused label"))
}

/// Rebinds a flagged import to `_`, keeping the import itself.
fn fix_import(spec: &CstNode, flagged: &FxHashSet<usize>) -> Option<Edit> {
    let path = spec.child_by_field("path")?;
    let name = spec.child_by_field("name");
    let hit = flagged.contains(&spec.start_byte)
        || flagged.contains(&path.start_byte)
        || name.is_some_and(|n| flagged.contains(&n.start_byte));
    if !hit {
        return None;
    }
    let edit = match name {
        Some(alias) => Edit::new(alias.start_byte, alias.end_byte, DISCARD_IDENT),
        None => Edit::insert(path.start_byte, format!("{DISCARD_IDENT} ")),
    };
    Some(edit.describe("blank import"))
}

/// Turns `:=` into `=` when flagged, or when every target ends up `_`.
fn downgrade(
    stmt: &CstNode,
    source: &str,
    flagged: &FxHashSet<usize>,
    blanked: &FxHashSet<usize>,
) -> Option<Edit> {
    let token = stmt.child_of_kind(":=")?;
    let all_discarded = stmt.child_by_field("left").is_some_and(|left| {
        left.named_children()
            .all(|t| blanked.contains(&t.start_byte) || t.text(source) == DISCARD_IDENT)
    });
    if !flagged.contains(&token.start_byte) && !all_discarded {
        return None;
    }
    tracing::debug!(at = token.start_byte, "downgrading := to =");
    Some(Edit::new(token.start_byte, token.end_byte, "=").describe("downgrade :="))
}
