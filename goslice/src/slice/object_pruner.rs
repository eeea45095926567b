//! Deletion of declarations the oracle confirmed as unused.
//!
//! Objects are matched by the byte offset of their declaring identifier.
//! Methods also go when their receiver's base type is itself unused.

use std::path::Path;

use rustc_hash::FxHashSet;

use super::Pruned;
use crate::constants::DISCARD_IDENT;
use crate::cst::{declaration_span, extract_comments, Comment, CstNode, CstTree};
use crate::error::SliceError;
use crate::fix::Edit;
use crate::oracle::FlaggedObject;

/// Removes flagged objects from one parsed file.
pub struct DeadObjectPruner<'a> {
    tree: &'a CstTree,
    path: &'a Path,
    offsets: FxHashSet<usize>,
    dead_types: &'a FxHashSet<String>,
    comments: Vec<Comment>,
}

impl<'a> DeadObjectPruner<'a> {
    /// `objects` are the flagged objects of this file; `dead_types` names
    /// the unused types of the file's package.
    #[must_use]
    pub fn new(
        tree: &'a CstTree,
        path: &'a Path,
        objects: &[FlaggedObject],
        dead_types: &'a FxHashSet<String>,
    ) -> Self {
        Self {
            tree,
            path,
            offsets: objects.iter().map(|o| o.offset).collect(),
            dead_types,
            comments: extract_comments(tree),
        }
    }

    /// Plans the removals for the file.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::UnrecognizedShape`] for a method receiver or
    /// struct field this pruner cannot decode.
    pub fn prune(&self) -> Result<Vec<Edit>, SliceError> {
        let mut edits = Vec::new();
        for decl in self.tree.root.named_children() {
            let outcome = match decl.kind {
                "function_declaration" => self.prune_function(decl),
                "method_declaration" => self.prune_method(decl)?,
                "var_declaration" => self.prune_value_decl(decl, "var_spec", false),
                "const_declaration" => self.prune_value_decl(decl, "const_spec", true),
                "type_declaration" => self.prune_type_decl(decl)?,
                "import_declaration" => self.prune_imports(decl),
                _ => Pruned::Kept(Vec::new()),
            };
            match outcome {
                Pruned::Removed => {
                    tracing::debug!(kind = decl.kind, at = decl.start_byte, "removing dead declaration");
                    edits.push(self.remove(decl));
                }
                Pruned::Kept(nested) => edits.extend(nested),
            }
        }
        Ok(edits)
    }

    fn is_flagged(&self, node: Option<&CstNode>) -> bool {
        node.is_some_and(|n| self.offsets.contains(&n.start_byte))
    }

    fn remove(&self, node: &CstNode) -> Edit {
        let (start, end) = declaration_span(&self.tree.source, &self.comments, node);
        Edit::delete(start, end).describe(format!("remove unused {}", node.kind))
    }

    fn shape_error(&self, what: &'static str, node: &CstNode) -> SliceError {
        SliceError::UnrecognizedShape {
            path: self.path.to_path_buf(),
            what,
            kind: node.kind.to_owned(),
            offset: node.start_byte,
        }
    }

    fn prune_function(&self, decl: &CstNode) -> Pruned {
        if self.is_flagged(decl.child_by_field("name")) {
            Pruned::Removed
        } else {
            Pruned::Kept(Vec::new())
        }
    }

    fn prune_method(&self, decl: &CstNode) -> Result<Pruned, SliceError> {
        if self.is_flagged(decl.child_by_field("name")) {
            return Ok(Pruned::Removed);
        }
        let base = self.receiver_base_type(decl)?;
        if self.dead_types.contains(base) {
            tracing::debug!(receiver = base, "method of unused type");
            return Ok(Pruned::Removed);
        }
        Ok(Pruned::Kept(Vec::new()))
    }

    /// Base type name of a receiver: `T`, `*T`, `T[K]`, `*T[K]`, possibly
    /// parenthesized.
    fn receiver_base_type(&self, method: &CstNode) -> Result<&'a str, SliceError> {
        let source: &'a str = &self.tree.source;
        let receiver = method
            .child_by_field("receiver")
            .ok_or_else(|| self.shape_error("receiver", method))?;
        let param = receiver
            .named_children()
            .find(|c| c.kind == "parameter_declaration")
            .ok_or_else(|| self.shape_error("receiver", receiver))?;
        let mut ty = param
            .child_by_field("type")
            .ok_or_else(|| self.shape_error("receiver", param))?;
        loop {
            let next = match ty.kind {
                "type_identifier" => return Ok(ty.text(source)),
                "pointer_type" | "parenthesized_type" => ty.named_children().next(),
                "generic_type" => ty.child_by_field("type"),
                _ => None,
            };
            ty = next.ok_or_else(|| self.shape_error("receiver", ty))?;
        }
    }

    fn prune_value_decl(&self, decl: &CstNode, spec_kind: &str, is_const: bool) -> Pruned {
        let specs = specs_of(decl, spec_kind);
        // Specs without a value repeat the previous expression; removing one
        // would shift every `iota` after it.
        let implicit = is_const && specs.iter().any(|s| s.child_by_field("value").is_none());

        let flagged: Vec<(usize, usize)> = specs
            .iter()
            .map(|spec| {
                let names: Vec<&CstNode> = spec.children_by_field("name").collect();
                let hits = names
                    .iter()
                    .filter(|n| self.offsets.contains(&n.start_byte))
                    .count();
                (hits, names.len())
            })
            .collect();
        if !specs.is_empty() && flagged.iter().all(|&(hits, total)| hits == total && hits > 0) {
            return Pruned::Removed;
        }

        let mut edits = Vec::new();
        for (spec, &(hits, total)) in specs.iter().zip(&flagged) {
            if hits == 0 {
                continue;
            }
            if hits == total && !implicit {
                edits.push(self.remove(spec));
                continue;
            }
            for name in spec.children_by_field("name") {
                if self.offsets.contains(&name.start_byte) {
                    edits.push(
                        Edit::new(name.start_byte, name.end_byte, DISCARD_IDENT)
                            .describe("blank unused name"),
                    );
                }
            }
        }
        Pruned::Kept(edits)
    }

    fn prune_type_decl(&self, decl: &CstNode) -> Result<Pruned, SliceError> {
        let specs: Vec<&CstNode> = specs_of(decl, "type_spec")
            .into_iter()
            .chain(specs_of(decl, "type_alias"))
            .collect();

        let mut edits = Vec::new();
        let mut removed = 0usize;
        for spec in &specs {
            let outcome = if self.is_flagged(spec.child_by_field("name")) {
                Pruned::Removed
            } else {
                match spec.child_by_field("type") {
                    Some(ty) if ty.kind == "struct_type" => self.prune_struct(ty)?,
                    _ => Pruned::Kept(Vec::new()),
                }
            };
            match outcome {
                Pruned::Removed => {
                    removed += 1;
                    edits.push(self.remove(spec));
                }
                Pruned::Kept(nested) => edits.extend(nested),
            }
        }

        if !specs.is_empty() && removed == specs.len() {
            return Ok(Pruned::Removed);
        }
        Ok(Pruned::Kept(edits))
    }

    fn prune_struct(&self, struct_type: &CstNode) -> Result<Pruned, SliceError> {
        let Some(list) = struct_type.child_of_kind("field_declaration_list") else {
            return Ok(Pruned::Kept(Vec::new()));
        };
        let fields: Vec<&CstNode> = list
            .named_children()
            .filter(|c| c.kind == "field_declaration")
            .collect();

        let mut edits = Vec::new();
        let mut removed = 0usize;
        for field in &fields {
            let names: Vec<&CstNode> = field.children_by_field("name").collect();
            if names.is_empty() {
                let ty = field
                    .child_by_field("type")
                    .ok_or_else(|| self.shape_error("field", field))?;
                if self.offsets.iter().any(|&o| ty.contains_byte(o)) {
                    removed += 1;
                    edits.push(self.remove(field));
                }
                continue;
            }

            let kept: Vec<&CstNode> = names
                .iter()
                .copied()
                .filter(|n| !self.offsets.contains(&n.start_byte))
                .collect();
            if kept.len() == names.len() {
                continue;
            }
            if kept.is_empty() {
                removed += 1;
                edits.push(self.remove(field));
                continue;
            }
            let source = &self.tree.source;
            let joined = kept
                .iter()
                .map(|n| n.text(source))
                .collect::<Vec<_>>()
                .join(", ");
            let first = names[0].start_byte;
            let last = names[names.len() - 1].end_byte;
            edits.push(Edit::new(first, last, joined).describe("drop unused field names"));
        }

        if !fields.is_empty() && removed == fields.len() {
            return Ok(Pruned::Removed);
        }
        Ok(Pruned::Kept(edits))
    }

    fn prune_imports(&self, decl: &CstNode) -> Pruned {
        let specs = specs_of(decl, "import_spec");
        let mut edits = Vec::new();
        let mut removed = 0usize;
        for spec in &specs {
            let hit = self.offsets.contains(&spec.start_byte)
                || self.is_flagged(spec.child_by_field("name"))
                || self.is_flagged(spec.child_by_field("path"));
            if hit {
                removed += 1;
                edits.push(self.remove(spec));
            }
        }
        if !specs.is_empty() && removed == specs.len() {
            return Pruned::Removed;
        }
        Pruned::Kept(edits)
    }
}

/// Specs of a declaration, whether written inline or in a parenthesized
/// group.
fn specs_of<'n>(decl: &'n CstNode, kind: &str) -> Vec<&'n CstNode> {
    let mut specs = Vec::new();
    for child in decl.named_children() {
        if child.kind == kind {
            specs.push(child);
        } else if child.kind.ends_with("_spec_list") {
            specs.extend(child.named_children().filter(|c| c.kind == kind));
        }
    }
    specs
}
