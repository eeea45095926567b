//! Coverage-driven structural pruning of one Go file.
//!
//! A node is deleted when its whole span lies inside an uncovered range.
//! Containers that lose every statement disappear with their guards, and
//! callables are repaired so the file keeps compiling:
//!
//! - a body emptied out of a function with results becomes a bare `return`,
//!   with unnamed results renamed to `_` so the bare return is legal;
//! - a body emptied out of a function without results becomes `{}`;
//! - a trailing terminating statement that was pruned is kept when other
//!   statements survive, so "missing return" cannot appear.
//!
//! Missing `else` or `default` arms that a terminator depended on are not
//! reconstructed.

use super::Pruned;
use crate::constants::{CASE_KINDS, DISCARD_IDENT, DISPATCH_KINDS};
use crate::cst::{declaration_span, extract_comments, node_span, statements};
use crate::cst::{Comment, CstNode, CstTree};
use crate::fix::Edit;
use crate::position::ByteRange;

/// Result of pruning a whole file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneOutcome {
    /// No declaration survived; the file must not be emitted.
    Empty,
    /// The file survives; applying the edits yields the pruned text.
    Kept(Vec<Edit>),
}

/// Structural pruner over one parsed file and its uncovered ranges.
pub struct RangePruner<'a> {
    source: &'a str,
    root: &'a CstNode,
    ranges: &'a [ByteRange],
    comments: Vec<Comment>,
}

impl<'a> RangePruner<'a> {
    /// Creates a pruner for `tree` with the file's uncovered byte ranges.
    #[must_use]
    pub fn new(tree: &'a CstTree, ranges: &'a [ByteRange]) -> Self {
        Self {
            source: &tree.source,
            root: &tree.root,
            ranges,
            comments: extract_comments(tree),
        }
    }

    /// Prunes every top-level declaration of the file.
    #[must_use]
    pub fn prune(&self) -> PruneOutcome {
        let mut edits = Vec::new();
        let mut survivors = 0usize;

        for decl in self.root.named_children() {
            if matches!(decl.kind, "package_clause" | "comment") {
                continue;
            }
            match self.prune_node(decl) {
                Pruned::Removed => {
                    tracing::debug!(kind = decl.kind, at = decl.start_byte, "removing declaration");
                    let (start, end) = declaration_span(self.source, &self.comments, decl);
                    edits.push(Edit::delete(start, end).describe(format!("remove {}", decl.kind)));
                }
                Pruned::Kept(nested) => {
                    survivors += 1;
                    edits.extend(nested);
                }
            }
        }

        if survivors == 0 {
            return PruneOutcome::Empty;
        }
        PruneOutcome::Kept(edits)
    }

    /// Whether the node lies entirely inside one of the uncovered ranges.
    #[must_use]
    pub fn should_remove(&self, node: &CstNode) -> bool {
        self.ranges
            .iter()
            .any(|r| r.contains(node.start_byte, node.end_byte))
    }

    fn prune_node(&self, node: &CstNode) -> Pruned {
        if self.should_remove(node) {
            return Pruned::Removed;
        }
        match node.kind {
            "function_declaration" | "method_declaration" => self.prune_callable(node),
            "block" => self.prune_container(node).map_or(Pruned::Removed, Pruned::Kept),
            "if_statement" => self.prune_if(node),
            "for_statement" => self.prune_single_body(node, "body"),
            "labeled_statement" => self.prune_labeled(node),
            "assignment_statement" | "short_var_declaration" => self.prune_assignment(node),
            kind if DISPATCH_KINDS.contains(&kind) => self.prune_dispatch(node),
            _ => Pruned::Kept(Vec::new()),
        }
    }

    /// Prunes each statement, pairing it with its outcome.
    fn prune_statements<'n>(&self, stmts: &[&'n CstNode]) -> Vec<(&'n CstNode, Pruned)> {
        stmts.iter().map(|s| (*s, self.prune_node(s))).collect()
    }

    /// Turns per-statement outcomes into edits, skipping deletions of `keep`.
    fn collect_edits(&self, results: Vec<(&CstNode, Pruned)>, keep: Option<&CstNode>) -> Vec<Edit> {
        let mut edits = Vec::new();
        for (stmt, result) in results {
            match result {
                Pruned::Removed if keep.is_some_and(|k| std::ptr::eq(k, stmt)) => {
                    tracing::debug!(at = stmt.start_byte, "keeping trailing terminator");
                }
                Pruned::Removed => {
                    let (start, end) = node_span(self.source, stmt);
                    tracing::debug!(kind = stmt.kind, start, end, "removing statement");
                    edits.push(Edit::delete(start, end).describe(format!("remove {}", stmt.kind)));
                }
                Pruned::Kept(nested) => edits.extend(nested),
            }
        }
        edits
    }

    /// Filters the statements of a block or case clause. `None` means
    /// every statement was pruned and the parent must treat the body as
    /// empty. A body that was empty in the source is kept as written.
    fn prune_container(&self, container: &CstNode) -> Option<Vec<Edit>> {
        let stmts = statements(container);
        let results = self.prune_statements(&stmts);
        if !results.is_empty() && results.iter().all(|(_, r)| matches!(r, Pruned::Removed)) {
            return None;
        }
        Some(self.collect_edits(results, None))
    }

    fn prune_callable(&self, node: &CstNode) -> Pruned {
        // Bodiless declarations (assembly stubs, linkname) are never touched.
        let Some(body) = node.child_by_field("body") else {
            return Pruned::Kept(Vec::new());
        };
        let stmts = statements(body);
        if stmts.is_empty() {
            return Pruned::Kept(Vec::new());
        }

        let results = self.prune_statements(&stmts);
        let survivors: Vec<&CstNode> = results
            .iter()
            .filter(|(_, r)| matches!(r, Pruned::Kept(_)))
            .map(|(s, _)| *s)
            .collect();

        if survivors.is_empty() {
            return Pruned::Kept(self.empty_body(node, body));
        }

        let original_last = stmts[stmts.len() - 1];
        let lost_terminator = is_terminating(original_last, self.source)
            && !survivors
                .last()
                .is_some_and(|s| std::ptr::eq(*s, original_last));
        let keep = lost_terminator.then_some(original_last);
        Pruned::Kept(self.collect_edits(results, keep))
    }

    /// Replacement for a callable whose every statement was pruned.
    fn empty_body(&self, node: &CstNode, body: &CstNode) -> Vec<Edit> {
        let Some(result) = node.child_by_field("result") else {
            return vec![Edit::new(body.start_byte, body.end_byte, "{\n}").describe("empty body")];
        };

        let mut edits = Vec::new();
        if result.kind == "parameter_list" {
            for param in result.named_children() {
                if param.kind == "parameter_declaration" && param.child_by_field("name").is_none() {
                    edits.push(Edit::insert(param.start_byte, format!("{DISCARD_IDENT} ")));
                }
            }
        } else {
            edits.push(Edit::insert(result.start_byte, format!("({DISCARD_IDENT} ")));
            edits.push(Edit::insert(result.end_byte, ")"));
        }
        edits.push(
            Edit::new(body.start_byte, body.end_byte, "{\n\treturn\n}").describe("bare return body"),
        );
        edits
    }

    fn prune_single_body(&self, node: &CstNode, field: &str) -> Pruned {
        match node.child_by_field(field) {
            Some(body) => self.prune_container(body).map_or(Pruned::Removed, Pruned::Kept),
            None => Pruned::Kept(Vec::new()),
        }
    }

    fn prune_if(&self, node: &CstNode) -> Pruned {
        let Some(consequence) = node.child_by_field("consequence") else {
            return Pruned::Kept(Vec::new());
        };
        let kept_consequence = self.prune_container(consequence);

        let Some(alternative) = node.child_by_field("alternative") else {
            return kept_consequence.map_or(Pruned::Removed, Pruned::Kept);
        };
        let kept_alternative = match self.prune_node(alternative) {
            Pruned::Removed => None,
            Pruned::Kept(edits) => Some(edits),
        };

        match (kept_consequence, kept_alternative) {
            (None, None) => Pruned::Removed,
            (None, Some(mut edits)) => {
                edits.push(Edit::new(consequence.start_byte, consequence.end_byte, "{\n}"));
                Pruned::Kept(edits)
            }
            (Some(mut edits), None) => {
                edits.push(
                    Edit::delete(consequence.end_byte, alternative.end_byte).describe("remove else"),
                );
                Pruned::Kept(edits)
            }
            (Some(mut edits), Some(more)) => {
                edits.extend(more);
                Pruned::Kept(edits)
            }
        }
    }

    fn prune_dispatch(&self, node: &CstNode) -> Pruned {
        let mut edits = Vec::new();
        let mut survivors = 0usize;
        let mut clauses = 0usize;

        for clause in node.named_children() {
            if !CASE_KINDS.contains(&clause.kind) {
                continue;
            }
            clauses += 1;
            if self.should_remove(clause) {
                edits.push(self.delete_clause(clause));
                continue;
            }
            // An empty arm is deliberate in the source; keep it as written.
            if statements(clause).is_empty() {
                survivors += 1;
                continue;
            }
            match self.prune_container(clause) {
                Some(nested) => {
                    survivors += 1;
                    edits.extend(nested);
                }
                None => edits.push(self.delete_clause(clause)),
            }
        }

        // `select {}` and friends have no clause to lose.
        if clauses > 0 && survivors == 0 {
            return Pruned::Removed;
        }
        Pruned::Kept(edits)
    }

    fn delete_clause(&self, clause: &CstNode) -> Edit {
        let (start, end) = node_span(self.source, clause);
        tracing::debug!(kind = clause.kind, start, end, "removing case clause");
        Edit::delete(start, end).describe("remove case clause")
    }

    fn prune_labeled(&self, node: &CstNode) -> Pruned {
        let inner = node
            .named_children()
            .find(|c| c.field.is_none() && c.kind != "comment");
        match inner {
            Some(stmt) => self.prune_node(stmt),
            None => Pruned::Kept(Vec::new()),
        }
    }

    /// Multi-target assignments are judged by their first target only.
    fn prune_assignment(&self, node: &CstNode) -> Pruned {
        let Some(left) = node.child_by_field("left") else {
            return Pruned::Kept(Vec::new());
        };
        let mut targets = left.named_children().filter(|t| t.kind != "comment");
        let first = targets.next();
        let is_multi = targets.next().is_some();
        match first {
            Some(first) if is_multi && self.should_remove(first) => Pruned::Removed,
            _ => Pruned::Kept(Vec::new()),
        }
    }
}

/// `return`, `goto`, or a bare `panic(...)` call.
#[must_use]
pub fn is_terminating(stmt: &CstNode, source: &str) -> bool {
    match stmt.kind {
        "return_statement" | "goto_statement" => true,
        "expression_statement" => stmt
            .named_children()
            .find(|c| c.kind == "call_expression")
            .and_then(|call| call.child_by_field("function"))
            .is_some_and(|f| f.kind == "identifier" && f.text(source) == "panic"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::GoParser;
    use crate::fix::ByteRangeRewriter;

    fn prune_text(source: &str, uncovered: &[&str]) -> Option<String> {
        let mut parser = GoParser::new().unwrap();
        let tree = parser.parse(source).unwrap();
        let ranges: Vec<ByteRange> = uncovered
            .iter()
            .map(|needle| {
                let start = source.find(needle).unwrap();
                ByteRange::new(start, start + needle.len())
            })
            .collect();
        match RangePruner::new(&tree, &ranges).prune() {
            PruneOutcome::Empty => None,
            PruneOutcome::Kept(edits) => {
                let mut rewriter = ByteRangeRewriter::new(source);
                rewriter.add_edits(edits);
                Some(rewriter.apply_verified().unwrap())
            }
        }
    }

    #[test]
    fn test_statement_inside_range_removed() {
        let source = "package p\n\nfunc F() {\n\ta()\n\tb()\n}\n";
        let out = prune_text(source, &["b()"]).unwrap();
        assert_eq!(out, "package p\n\nfunc F() {\n\ta()\n}\n");
    }

    #[test]
    fn test_partial_overlap_not_removed() {
        let source = "package p\n\nfunc F() {\n\tabc()\n}\n";
        // Range covers only part of the call.
        let out = prune_text(source, &["abc"]).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn test_empty_function_without_results_keeps_empty_body() {
        let source = "package p\n\nfunc F() {\n\ta()\n}\n";
        let out = prune_text(source, &["a()"]).unwrap();
        assert_eq!(out, "package p\n\nfunc F() {\n}\n");
    }

    #[test]
    fn test_empty_function_with_results_gets_bare_return() {
        let source = "package p\n\nfunc F() (int, error) {\n\treturn g()\n}\n";
        let out = prune_text(source, &["return g()"]).unwrap();
        assert_eq!(
            out,
            "package p\n\nfunc F() (_ int, _ error) {\n\treturn\n}\n"
        );
    }

    #[test]
    fn test_simple_result_type_is_parenthesized() {
        let source = "package p\n\nfunc F() int {\n\treturn 1\n}\n";
        let out = prune_text(source, &["return 1"]).unwrap();
        assert_eq!(out, "package p\n\nfunc F() (_ int) {\n\treturn\n}\n");
    }

    #[test]
    fn test_named_results_left_alone() {
        let source = "package p\n\nfunc F() (err error) {\n\terr = g()\n\treturn\n}\n";
        let out = prune_text(source, &["err = g()\n\treturn"]).unwrap();
        assert_eq!(out, "package p\n\nfunc F() (err error) {\n\treturn\n}\n");
    }

    #[test]
    fn test_trailing_return_is_preserved() {
        let source =
            "package p\n\nfunc F() int {\n\tx := 1\n\tif x > 0 {\n\t\treturn x\n\t}\n\treturn 0\n}\n";
        let out = prune_text(source, &["return 0"]).unwrap();
        assert!(out.trim_end().ends_with("return 0\n}"));
    }

    #[test]
    fn test_if_with_empty_body_removed() {
        let source = "package p\n\nfunc F() {\n\tif false {\n\t\tdoWork()\n\t}\n\tdone()\n}\n";
        let out = prune_text(source, &["doWork()"]).unwrap();
        assert_eq!(out, "package p\n\nfunc F() {\n\tdone()\n}\n");
    }

    #[test]
    fn test_if_else_keeps_surviving_alternative() {
        let source = "package p\n\nfunc F(b bool) {\n\tif b {\n\t\ta()\n\t} else {\n\t\tc()\n\t}\n}\n";
        let out = prune_text(source, &["a()"]).unwrap();
        assert!(out.contains("if b {\n}"));
        assert!(out.contains("c()"));
    }

    #[test]
    fn test_if_else_drops_dead_alternative() {
        let source = "package p\n\nfunc F(b bool) {\n\tif b {\n\t\ta()\n\t} else {\n\t\tc()\n\t}\n}\n";
        let out = prune_text(source, &["c()"]).unwrap();
        assert_eq!(out, "package p\n\nfunc F(b bool) {\n\tif b {\n\t\ta()\n\t}\n}\n");
    }

    #[test]
    fn test_for_with_empty_body_removed() {
        let source = "package p\n\nfunc F(xs []int) {\n\tfor _, x := range xs {\n\t\tuse(x)\n\t}\n\tend()\n}\n";
        let out = prune_text(source, &["use(x)"]).unwrap();
        assert!(!out.contains("range"));
        assert!(out.contains("end()"));
    }

    #[test]
    fn test_switch_drops_dead_cases() {
        let source = "package p\n\nfunc F(n int) {\n\tswitch n {\n\tcase 1:\n\t\tone()\n\tcase 2:\n\t\ttwo()\n\t}\n}\n";
        let out = prune_text(source, &["two()"]).unwrap();
        assert!(out.contains("case 1:"));
        assert!(!out.contains("case 2:"));
    }

    #[test]
    fn test_switch_with_no_live_case_removed() {
        let source = "package p\n\nfunc F(n int) {\n\tswitch n {\n\tcase 1:\n\t\tone()\n\t}\n\tend()\n}\n";
        let out = prune_text(source, &["one()"]).unwrap();
        assert!(!out.contains("switch"));
    }

    #[test]
    fn test_bodies_empty_in_source_are_kept() {
        let source = "package p\n\nfunc F() {\n\tfor !ready() {\n\t}\n\tif c {\n\t}\n\tselect {}\n}\n\nfunc G() {\n\tdone()\n\tstop()\n}\n";
        let out = prune_text(source, &["done()"]).unwrap();
        assert!(out.contains("\tfor !ready() {\n\t}\n"));
        assert!(out.contains("\tif c {\n\t}\n"));
        assert!(out.contains("\tselect {}\n"));
        assert!(!out.contains("done()"));
    }

    #[test]
    fn test_labeled_statement_follows_its_loop() {
        let source = "package p\n\nfunc F() {\nouter:\n\tfor {\n\t\tspin()\n\t}\n\tend()\n}\n";
        let out = prune_text(source, &["spin()"]).unwrap();
        assert!(!out.contains("outer:"));
        assert!(out.contains("end()"));
    }

    #[test]
    fn test_multi_target_judged_by_first_target() {
        let source = "package p\n\nfunc F() {\n\ta, b := g()\n\tuse(a, b)\n}\n";
        let out = prune_text(source, &["a"]).unwrap();
        assert!(!out.contains("a, b := g()"));

        let out = prune_text(source, &["b :="]).unwrap();
        assert!(out.contains("a, b := g()"));
    }

    #[test]
    fn test_nothing_survived() {
        let source = "package p\n\nvar x = 1\n";
        assert!(prune_text(source, &["var x = 1"]).is_none());
    }

    #[test]
    fn test_bodiless_function_untouched() {
        let source = "package p\n\nfunc now() int64\n\nfunc F() {\n\ta()\n}\n";
        let out = prune_text(source, &["a()"]).unwrap();
        assert!(out.contains("func now() int64\n"));
    }

    #[test]
    fn test_panic_counts_as_terminator() {
        let mut parser = GoParser::new().unwrap();
        let source = "package p\n\nfunc F() {\n\tpanic(\"x\")\n}\n";
        let tree = parser.parse(source).unwrap();
        let body = tree.find_functions()[0].child_by_field("body").unwrap();
        assert!(is_terminating(statements(body)[0], source));
    }
}
