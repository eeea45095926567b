//! The unused-symbol oracle: a whole-program analyzer consulted between
//! cleanup rounds.
//!
//! An evaluation either succeeds with the objects that nothing references
//! any more, or fails with per-package diagnostics. Diagnostics are soft
//! when they only report an unused binding or import (the fixer can clear
//! them) and hard otherwise.

mod command;

pub use command::CommandOracle;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Kind of a declaration reported as unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Package-level function.
    Func,
    /// Method on a named type.
    Method,
    /// Named type.
    Type,
    /// Constant.
    Const,
    /// Package-level variable.
    Var,
    /// Struct field.
    Field,
    /// Import declaration.
    Import,
}

impl ObjectKind {
    /// Maps the keyword an analyzer uses in "<kind> <name> is unused".
    #[must_use]
    pub fn from_keyword(keyword: &str, name: &str) -> Option<Self> {
        let kind = match keyword {
            "func" if name.starts_with('(') => Self::Method,
            "func" => Self::Func,
            "type" => Self::Type,
            "const" => Self::Const,
            "var" => Self::Var,
            "field" => Self::Field,
            "import" => Self::Import,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Func => "func",
            Self::Method => "method",
            Self::Type => "type",
            Self::Const => "const",
            Self::Var => "var",
            Self::Field => "field",
            Self::Import => "import",
        };
        f.write_str(s)
    }
}

/// A declaration the oracle confirmed as unreferenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlaggedObject {
    /// Symbol name; methods are reduced to the bare method name.
    pub name: String,
    /// What was declared.
    pub kind: ObjectKind,
    /// Absolute path of the file holding the declaration.
    pub file: PathBuf,
    /// Byte offset of the declaring identifier.
    pub offset: usize,
}

/// A single analyzer finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Package the finding belongs to.
    pub package: String,
    /// Absolute path of the file.
    pub file: PathBuf,
    /// Byte offset of the reported position.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    /// Analyzer message.
    pub message: String,
    /// Whether the fixer can clear it.
    pub soft: bool,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file.display(),
            self.line,
            self.column,
            self.message
        )
    }
}

/// Diagnostics grouped by package, in package order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticSet {
    by_package: BTreeMap<String, Vec<Diagnostic>>,
}

impl DiagnosticSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagnostic under its package.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.by_package
            .entry(diagnostic.package.clone())
            .or_default()
            .push(diagnostic);
    }

    /// All diagnostics, package by package.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_package.values().flatten()
    }

    /// Diagnostics the fixer cannot clear.
    pub fn hard(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(|d| !d.soft)
    }

    /// Diagnostics the fixer can clear.
    pub fn soft(&self) -> impl Iterator<Item = &Diagnostic> {
        self.iter().filter(|d| d.soft)
    }

    /// Number of hard diagnostics.
    #[must_use]
    pub fn hard_count(&self) -> usize {
        self.hard().count()
    }

    /// Total number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_package.values().map(Vec::len).sum()
    }

    /// Whether the set holds no diagnostics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Soft diagnostic offsets grouped by file, files in path order.
    #[must_use]
    pub fn soft_offsets_by_file(&self) -> BTreeMap<PathBuf, Vec<usize>> {
        let mut files: BTreeMap<PathBuf, Vec<usize>> = BTreeMap::new();
        for diagnostic in self.soft() {
            files
                .entry(diagnostic.file.clone())
                .or_default()
                .push(diagnostic.offset);
        }
        files
    }
}

impl FromIterator<Diagnostic> for DiagnosticSet {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        let mut set = Self::new();
        for diagnostic in iter {
            set.push(diagnostic);
        }
        set
    }
}

/// Lists hard diagnostics first, each under its package.
impl fmt::Display for DiagnosticSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (package, diagnostics) in &self.by_package {
            for diagnostic in diagnostics.iter().filter(|d| !d.soft) {
                writeln!(f, "  {package}: {diagnostic}")?;
            }
        }
        Ok(())
    }
}

/// The program handed to the oracle: the destination root and the packages
/// produced there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Destination root the packages live under.
    pub root: PathBuf,
    /// Package paths relative to `root`, sorted and deduplicated.
    pub packages: Vec<String>,
}

/// Why an evaluation produced no unused-object list.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The program does not type-check cleanly.
    #[error("{} diagnostic(s) reported", .0.len())]
    Diagnostics(DiagnosticSet),
    /// The analyzer could not run or its output was unreadable.
    #[error("{0}")]
    Backend(String),
}

/// A whole-program unused-symbol analyzer.
pub trait UnusedOracle {
    /// Analyzes `program`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Diagnostics`] when the program has compile
    /// problems and [`OracleError::Backend`] when the analyzer itself failed.
    fn evaluate(&mut self, program: &Program) -> Result<Vec<FlaggedObject>, OracleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnostic(package: &str, message: &str, soft: bool) -> Diagnostic {
        Diagnostic {
            package: package.to_owned(),
            file: PathBuf::from(format!("/dst/{package}/a.go")),
            offset: 10,
            line: 2,
            column: 3,
            message: message.to_owned(),
            soft,
        }
    }

    #[test]
    fn test_set_splits_soft_and_hard() {
        let set: DiagnosticSet = vec![
            diagnostic("b", "x declared and not used", true),
            diagnostic("a", "undefined: y", false),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.hard_count(), 1);
        assert_eq!(set.soft().count(), 1);
        let shown = set.to_string();
        assert!(shown.contains("a: /dst/a/a.go:2:3: undefined: y"));
        assert!(!shown.contains("declared and not used"));
    }

    #[test]
    fn test_soft_offsets_grouped_by_file() {
        let mut set = DiagnosticSet::new();
        set.push(diagnostic("a", "x declared and not used", true));
        let mut second = diagnostic("a", "y declared and not used", true);
        second.offset = 20;
        set.push(second);

        let files = set.soft_offsets_by_file();
        assert_eq!(files.len(), 1);
        assert_eq!(files.values().next().unwrap(), &vec![10, 20]);
    }

    #[test]
    fn test_method_keyword() {
        assert_eq!(
            ObjectKind::from_keyword("func", "(*T).m"),
            Some(ObjectKind::Method)
        );
        assert_eq!(ObjectKind::from_keyword("func", "f"), Some(ObjectKind::Func));
        assert_eq!(ObjectKind::from_keyword("label", "l"), None);
    }
}
