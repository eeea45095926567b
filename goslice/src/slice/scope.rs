//! Lexical scope resolution for one Go file.
//!
//! Maps every `identifier` use to the byte offset of the identifier that
//! declares it. Only value bindings are tracked (variables, constants,
//! parameters, functions); types, fields, labels and package names live in
//! other namespaces and never need blanking.
//!
//! Names declared in other files of the same package stay unresolved.

use rustc_hash::FxHashMap;

use crate::constants::DISCARD_IDENT;
use crate::cst::{CstNode, CstTree};

/// Use-to-declaration map for one parsed file.
#[derive(Debug, Default, Clone)]
pub struct Bindings {
    resolved: FxHashMap<usize, usize>,
}

impl Bindings {
    /// Resolves all identifiers of `tree`.
    #[must_use]
    pub fn resolve(tree: &CstTree) -> Self {
        let mut resolver = ScopeResolver {
            source: &tree.source,
            scopes: vec![FxHashMap::default()],
            bindings: Self::default(),
        };
        resolver.declare_package_names(&tree.root);
        resolver.walk_children(&tree.root);
        resolver.bindings
    }

    /// Offset of the declaring identifier for the identifier at `offset`.
    ///
    /// A declaring identifier resolves to itself.
    #[must_use]
    pub fn declaration_of(&self, offset: usize) -> Option<usize> {
        self.resolved.get(&offset).copied()
    }

    /// Number of resolved identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    /// Whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

struct ScopeResolver<'a> {
    source: &'a str,
    scopes: Vec<FxHashMap<&'a str, usize>>,
    bindings: Bindings,
}

impl<'a> ScopeResolver<'a> {
    /// Package-level functions, variables and constants are visible
    /// everywhere in the file, including before their declaration.
    fn declare_package_names(&mut self, root: &'a CstNode) {
        for decl in root.named_children() {
            match decl.kind {
                "function_declaration" => {
                    if let Some(name) = decl.child_by_field("name") {
                        self.declare(name);
                    }
                }
                "var_declaration" | "const_declaration" => {
                    for spec in decl
                        .find_by_kind("var_spec")
                        .into_iter()
                        .chain(decl.find_by_kind("const_spec"))
                    {
                        for name in spec.children_by_field("name") {
                            self.declare(name);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn declare(&mut self, ident: &'a CstNode) {
        if ident.kind != "identifier" {
            return;
        }
        let name = ident.text(self.source);
        if name == DISCARD_IDENT {
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, ident.start_byte);
        }
        self.bindings.resolved.insert(ident.start_byte, ident.start_byte);
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn use_ident(&mut self, ident: &CstNode) {
        if let Some(decl) = self.lookup(ident.text(self.source)) {
            self.bindings.resolved.insert(ident.start_byte, decl);
        }
    }

    fn scoped(&mut self, f: impl FnOnce(&mut Self)) {
        self.scopes.push(FxHashMap::default());
        f(self);
        self.scopes.pop();
    }

    fn walk_children(&mut self, node: &'a CstNode) {
        for child in &node.children {
            self.walk(child);
        }
    }

    fn walk(&mut self, node: &'a CstNode) {
        match node.kind {
            "function_declaration" | "method_declaration" | "func_literal" => {
                self.walk_callable(node);
            }
            "block" | "if_statement" | "for_statement" | "expression_switch_statement"
            | "select_statement" | "expression_case" | "default_case" | "type_case"
            | "communication_case" => self.scoped(|r| r.walk_children(node)),
            "type_switch_statement" => self.scoped(|r| r.walk_type_switch(node)),
            "short_var_declaration" => self.walk_short_var(node),
            "range_clause" | "receive_statement" => self.walk_maybe_declaring(node),
            "var_spec" | "const_spec" => self.walk_value_spec(node),
            "parameter_declaration" | "variadic_parameter_declaration" => {
                if let Some(ty) = node.child_by_field("type") {
                    self.walk(ty);
                }
            }
            "keyed_element" => self.walk_keyed_element(node),
            "identifier" => self.use_ident(node),
            _ => self.walk_children(node),
        }
    }

    fn walk_callable(&mut self, node: &'a CstNode) {
        self.scoped(|r| {
            for field in ["receiver", "parameters", "result"] {
                let Some(list) = node.child_by_field(field) else {
                    continue;
                };
                if list.kind != "parameter_list" {
                    r.walk(list);
                    continue;
                }
                for param in list.named_children() {
                    r.walk(param);
                    for name in param.children_by_field("name") {
                        r.declare(name);
                    }
                }
            }
            // Parameters and the outermost body statements share one scope.
            if let Some(body) = node.child_by_field("body") {
                r.walk_children(body);
            }
        });
    }

    fn walk_short_var(&mut self, node: &'a CstNode) {
        if let Some(right) = node.child_by_field("right") {
            self.walk(right);
        }
        let Some(left) = node.child_by_field("left") else {
            return;
        };
        for ident in left.named_children() {
            let name = ident.text(self.source);
            let redeclared = self.scopes.last().and_then(|s| s.get(name).copied());
            match redeclared {
                Some(decl) => {
                    self.bindings.resolved.insert(ident.start_byte, decl);
                }
                None => self.declare(ident),
            }
        }
    }

    /// `for k, v := range xs` and `case v := <-ch` declare; `=` forms assign.
    fn walk_maybe_declaring(&mut self, node: &'a CstNode) {
        if node.child_of_kind(":=").is_none() {
            self.walk_children(node);
            return;
        }
        if let Some(right) = node.child_by_field("right") {
            self.walk(right);
        }
        if let Some(left) = node.child_by_field("left") {
            for ident in left.named_children() {
                self.declare(ident);
            }
        }
    }

    fn walk_value_spec(&mut self, node: &'a CstNode) {
        for field in ["type", "value"] {
            if let Some(child) = node.child_by_field(field) {
                self.walk(child);
            }
        }
        for name in node.children_by_field("name") {
            self.declare(name);
        }
    }

    fn walk_type_switch(&mut self, node: &'a CstNode) {
        if let Some(value) = node.child_by_field("value") {
            self.walk(value);
        }
        if let Some(alias) = node.child_by_field("alias") {
            for ident in alias.named_children() {
                self.declare(ident);
            }
        }
        for child in &node.children {
            if !matches!(child.field, Some("value" | "alias")) {
                self.walk(child);
            }
        }
    }

    /// Struct literal keys name fields, not variables.
    fn walk_keyed_element(&mut self, node: &'a CstNode) {
        let mut named = node.named_children();
        if let Some(key) = named.next() {
            let is_field_key = key.kind == "field_identifier"
                || key.kind == "identifier"
                || (key.kind == "literal_element"
                    && key.named_children().count() == 1
                    && key.named_children().all(|c| c.kind == "identifier"));
            if !is_field_key {
                self.walk(key);
            }
        }
        for rest in named {
            self.walk(rest);
        }
    }
}
