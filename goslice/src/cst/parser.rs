//! Tree-sitter based CST parser for Go source code.
//!
//! Provides precise byte-range information for safe code rewriting.

use tree_sitter::{Parser, TreeCursor};

/// A point in source code (row, column)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// Zero-indexed row number
    pub row: usize,
    /// Zero-indexed column (byte offset within line)
    pub column: usize,
}

impl From<tree_sitter::Point> for Point {
    fn from(p: tree_sitter::Point) -> Self {
        Self {
            row: p.row,
            column: p.column,
        }
    }
}

/// A CST node with exact source location
#[derive(Debug, Clone)]
pub struct CstNode {
    /// Node kind (e.g., "function_declaration", "identifier", ":=")
    pub kind: &'static str,
    /// Grammar field this node fills in its parent ("name", "body", ...)
    pub field: Option<&'static str>,
    /// Start byte offset (inclusive)
    pub start_byte: usize,
    /// End byte offset (exclusive)
    pub end_byte: usize,
    /// Start point (row, column)
    pub start_point: Point,
    /// End point (row, column)
    pub end_point: Point,
    /// Whether this is a named node (vs anonymous like punctuation)
    pub is_named: bool,
    /// Error or missing node inserted by error recovery
    pub is_error: bool,
    /// Child nodes in source order
    pub children: Vec<CstNode>,
}

impl CstNode {
    fn from_cursor(cursor: &mut TreeCursor<'_>, field: Option<&'static str>) -> Self {
        let node = cursor.node();
        let mut children = Vec::new();
        if cursor.goto_first_child() {
            loop {
                let child_field = cursor.field_name();
                children.push(Self::from_cursor(cursor, child_field));
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
            cursor.goto_parent();
        }

        Self {
            kind: node.kind(),
            field,
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_point: node.start_position().into(),
            end_point: node.end_position().into(),
            is_named: node.is_named(),
            is_error: node.is_error() || node.is_missing(),
            children,
        }
    }

    /// Source text covered by this node
    #[must_use]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start_byte..self.end_byte]
    }

    /// First child filling the given grammar field
    #[must_use]
    pub fn child_by_field(&self, field: &str) -> Option<&CstNode> {
        self.children.iter().find(|c| c.field == Some(field))
    }

    /// All children filling the given grammar field, in order
    pub fn children_by_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a CstNode> {
        self.children.iter().filter(move |c| c.field == Some(field))
    }

    /// Named children, skipping punctuation and keywords
    pub fn named_children(&self) -> impl Iterator<Item = &CstNode> {
        self.children.iter().filter(|c| c.is_named)
    }

    /// First direct child of the given kind
    #[must_use]
    pub fn child_of_kind(&self, kind: &str) -> Option<&CstNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// Check if this node's range contains the given byte offset
    #[must_use]
    pub fn contains_byte(&self, byte: usize) -> bool {
        byte >= self.start_byte && byte < self.end_byte
    }

    /// Find all nodes of a specific kind
    #[must_use]
    pub fn find_by_kind(&self, kind: &str) -> Vec<&CstNode> {
        let mut result = Vec::new();
        self.find_by_kind_recursive(kind, &mut result);
        result
    }

    fn find_by_kind_recursive<'a>(&'a self, kind: &str, result: &mut Vec<&'a CstNode>) {
        if self.kind == kind {
            result.push(self);
        }
        for child in &self.children {
            child.find_by_kind_recursive(kind, result);
        }
    }

    /// Byte offset of the first error or missing node below this one
    #[must_use]
    pub fn first_error(&self) -> Option<usize> {
        if self.is_error {
            return Some(self.start_byte);
        }
        self.children.iter().find_map(CstNode::first_error)
    }
}

/// A parsed CST tree
#[derive(Debug)]
pub struct CstTree {
    /// Root node of the CST
    pub root: CstNode,
    /// Original source code
    pub source: String,
}

impl CstTree {
    /// Extract a slice of source code by byte range
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> &str {
        &self.source[start..end]
    }

    /// Byte offset of the first syntax error, if the source did not parse cleanly
    #[must_use]
    pub fn first_error(&self) -> Option<usize> {
        self.root.first_error()
    }

    /// Find all top-level and method function declarations
    #[must_use]
    pub fn find_functions(&self) -> Vec<&CstNode> {
        let mut functions = self.root.find_by_kind("function_declaration");
        functions.extend(self.root.find_by_kind("method_declaration"));
        functions.sort_by_key(|f| f.start_byte);
        functions
    }
}

/// Error during CST parsing
#[derive(Debug, thiserror::Error)]
pub enum CstError {
    /// Failed to create parser
    #[error("failed to create CST parser: {0}")]
    ParserCreation(String),
    /// Failed to parse source
    #[error("failed to parse source as Go")]
    ParseFailed,
}

/// Tree-sitter based CST parser
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Create a new CST parser for Go
    ///
    /// # Errors
    /// Returns error if parser creation fails
    pub fn new() -> Result<Self, CstError> {
        let mut parser = Parser::new();

        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| CstError::ParserCreation(e.to_string()))?;

        Ok(Self { parser })
    }

    /// Parse source code into a CST
    ///
    /// # Errors
    /// Returns error if parsing fails
    pub fn parse(&mut self, source: &str) -> Result<CstTree, CstError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(CstError::ParseFailed)?;

        let mut cursor = tree.walk();
        let root = CstNode::from_cursor(&mut cursor, None);

        Ok(CstTree {
            root,
            source: source.to_owned(),
        })
    }
}
