//! Oracle backed by an external analyzer that prints one JSON finding per
//! line, in the format of `staticcheck -f json`:
//!
//! ```text
//! {"code":"U1000","severity":"error","location":{"file":"/w/p/a.go","line":3,"column":6},"message":"func helper is unused"}
//! {"code":"compile","severity":"error","location":{"file":"/w/p/a.go","line":9,"column":2},"message":"declared and not used: x"}
//! ```

use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::process::Command;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use super::{Diagnostic, DiagnosticSet, FlaggedObject, ObjectKind, OracleError, Program, UnusedOracle};
use crate::constants::{get_soft_diagnostic_re, get_unused_object_re, COMPILE_CODE};
use crate::position::PositionIndex;

#[derive(Debug, Deserialize)]
struct RawFinding {
    code: String,
    #[serde(default)]
    severity: String,
    location: RawLocation,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    file: String,
    line: usize,
    column: usize,
}

/// Runs an analyzer command in the destination root.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    program: String,
    args: Vec<String>,
    unused_code: String,
}

impl CommandOracle {
    /// Creates an oracle from a command line and the code it uses for
    /// unused-object findings.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Backend`] if `command` is empty.
    pub fn new(command: &[String], unused_code: impl Into<String>) -> Result<Self, OracleError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| OracleError::Backend("empty oracle command".to_owned()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            unused_code: unused_code.into(),
        })
    }

    /// Turns analyzer output into unused objects or diagnostics.
    ///
    /// Relative file names are taken relative to `root`. Positions are
    /// converted to byte offsets against the files as they are on disk.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Diagnostics`] when any compile finding is
    /// present, and [`OracleError::Backend`] for unreadable lines or
    /// positions that do not exist.
    pub fn parse_output(&self, root: &Path, output: &str) -> Result<Vec<FlaggedObject>, OracleError> {
        let mut indexes: FxHashMap<PathBuf, PositionIndex> = FxHashMap::default();
        let mut objects = Vec::new();
        let mut diagnostics = DiagnosticSet::new();

        for (i, line) in output.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let finding: RawFinding = serde_json::from_str(line).map_err(|e| {
                OracleError::Backend(format!("unreadable analyzer output at line {}: {e}", i + 1))
            })?;

            let is_unused = finding.code == self.unused_code;
            if !is_unused && finding.code != COMPILE_CODE {
                tracing::debug!(code = %finding.code, message = %finding.message, "ignoring finding");
                continue;
            }

            let file = resolve_file(root, &finding.location.file);
            let offset = offset_of(&mut indexes, &file, &finding.location)?;

            if is_unused {
                match parse_unused(&finding.message) {
                    Some((kind, name)) => objects.push(FlaggedObject {
                        name,
                        kind,
                        file,
                        offset,
                    }),
                    None => {
                        tracing::debug!(message = %finding.message, "unrecognized unused finding");
                    }
                }
                continue;
            }

            let soft = get_soft_diagnostic_re().is_match(&finding.message);
            tracing::debug!(
                soft,
                severity = %finding.severity,
                file = %file.display(),
                offset,
                message = %finding.message,
                "compile diagnostic"
            );
            diagnostics.push(Diagnostic {
                package: package_of(root, &file),
                file,
                offset,
                line: finding.location.line,
                column: finding.location.column,
                message: finding.message,
                soft,
            });
        }

        if diagnostics.is_empty() {
            Ok(objects)
        } else {
            Err(OracleError::Diagnostics(diagnostics))
        }
    }
}

impl UnusedOracle for CommandOracle {
    fn evaluate(&mut self, program: &Program) -> Result<Vec<FlaggedObject>, OracleError> {
        let patterns: Vec<String> = program
            .packages
            .iter()
            .map(|p| {
                if p.is_empty() || p == "." {
                    ".".to_owned()
                } else {
                    format!("./{p}")
                }
            })
            .collect();
        tracing::info!(command = %self.program, packages = ?patterns, "running oracle");

        let output = Command::new(&self.program)
            .args(&self.args)
            .args(&patterns)
            .current_dir(&program.root)
            .output()
            .map_err(|e| OracleError::Backend(format!("cannot run `{}`: {e}", self.program)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        // Analyzers exit non-zero whenever they report something.
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OracleError::Backend(format!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        self.parse_output(&program.root, &stdout)
    }
}

fn resolve_file(root: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn offset_of(
    indexes: &mut FxHashMap<PathBuf, PositionIndex>,
    file: &Path,
    location: &RawLocation,
) -> Result<usize, OracleError> {
    let index = match indexes.entry(file.to_path_buf()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            let source = std::fs::read_to_string(file).map_err(|e| {
                OracleError::Backend(format!("cannot read {}: {e}", file.display()))
            })?;
            entry.insert(PositionIndex::new(&source))
        }
    };
    index
        .offset(location.line, location.column)
        .map_err(|e| OracleError::Backend(format!("{}: {e}", file.display())))
}

/// Package directory of `file`, relative to `root` when possible.
fn package_of(root: &Path, file: &Path) -> String {
    let dir = file.parent().unwrap_or(file);
    let rel = dir.strip_prefix(root).unwrap_or(dir);
    let shown = rel.to_string_lossy().replace('\\', "/");
    if shown.is_empty() {
        ".".to_owned()
    } else {
        shown
    }
}

/// `func (*T).m is unused` gives `(Method, "m")`.
fn parse_unused(message: &str) -> Option<(ObjectKind, String)> {
    let caps = get_unused_object_re().captures(message)?;
    let keyword = caps.get(1)?.as_str();
    let raw = caps.get(2)?.as_str();
    let kind = ObjectKind::from_keyword(keyword, raw)?;
    let name = match raw.rsplit_once(").") {
        Some((_, method)) if raw.starts_with('(') => method,
        _ => raw,
    };
    Some((kind, name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, CommandOracle) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("p")).unwrap();
        fs::write(
            dir.path().join("p/a.go"),
            "package p\n\nfunc helper() {}\n\nfunc (t *T) m() {}\n",
        )
        .unwrap();
        let command = vec!["staticcheck".to_owned()];
        (dir, CommandOracle::new(&command, "U1000").unwrap())
    }

    #[test]
    fn test_unused_findings_become_objects() {
        let (dir, oracle) = fixture();
        let output = concat!(
            r#"{"code":"U1000","severity":"error","location":{"file":"p/a.go","line":3,"column":6},"message":"func helper is unused"}"#,
            "\n",
            r#"{"code":"U1000","severity":"error","location":{"file":"p/a.go","line":5,"column":13},"message":"func (*T).m is unused"}"#,
            "\n",
            r#"{"code":"SA4006","severity":"error","location":{"file":"p/a.go","line":3,"column":1},"message":"something else"}"#,
        );

        let objects = oracle.parse_output(dir.path(), output).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].name, "helper");
        assert_eq!(objects[0].kind, ObjectKind::Func);
        assert_eq!(objects[0].offset, 16);
        assert_eq!(objects[1].name, "m");
        assert_eq!(objects[1].kind, ObjectKind::Method);
        assert_eq!(objects[1].file, dir.path().join("p/a.go"));
    }

    #[test]
    fn test_compile_findings_are_diagnostics() {
        let (dir, oracle) = fixture();
        let output = concat!(
            r#"{"code":"compile","location":{"file":"p/a.go","line":3,"column":6},"message":"declared and not used: x"}"#,
            "\n",
            r#"{"code":"compile","location":{"file":"p/a.go","line":5,"column":1},"message":"undefined: T"}"#,
        );

        let Err(OracleError::Diagnostics(set)) = oracle.parse_output(dir.path(), output) else {
            panic!("expected diagnostics");
        };
        assert_eq!(set.len(), 2);
        assert_eq!(set.hard_count(), 1);
        let soft = set.soft().next().unwrap();
        assert_eq!(soft.package, "p");
        assert_eq!(soft.offset, 16);
    }

    #[test]
    fn test_unused_label_is_soft() {
        let (dir, oracle) = fixture();
        let output = r#"{"code":"compile","location":{"file":"p/a.go","line":3,"column":1},"message":"label outer defined and not used"}"#;

        let Err(OracleError::Diagnostics(set)) = oracle.parse_output(dir.path(), output) else {
            panic!("expected diagnostics");
        };
        assert_eq!(set.hard_count(), 0);
        assert_eq!(set.soft().count(), 1);
    }

    #[test]
    fn test_garbage_output_is_backend_error() {
        let (dir, oracle) = fixture();
        let err = oracle.parse_output(dir.path(), "not json").unwrap_err();
        assert!(matches!(err, OracleError::Backend(_)));
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandOracle::new(&[], "U1000").is_err());
    }
}
