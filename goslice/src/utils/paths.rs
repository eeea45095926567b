//! Path utilities for goslice.
//!
//! This module consolidates all path-related logic for:
//! - Cross-platform path normalization for display
//! - Resolving coverage report paths against the source roots
//! - Keeping the destination root apart from every source root

use std::path::{Component, Path, PathBuf};

use crate::error::SliceError;

/// Normalizes a path for CLI display.
///
/// - Converts backslashes to forward slashes (for cross-platform consistency)
/// - Strips leading "./" or ".\" prefix (for cleaner output)
///
/// # Examples
/// ```
/// use std::path::Path;
/// use goslice::utils::normalize_display_path;
///
/// assert_eq!(normalize_display_path(Path::new(".\\slicer\\P\\P.go")), "slicer/P/P.go");
/// assert_eq!(normalize_display_path(Path::new("./P/util.go")), "P/util.go");
/// ```
#[must_use]
pub fn normalize_display_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    // Strip Windows extended path prefix if present
    let clean = s.trim_start_matches(r"\\?\");
    let normalized = clean.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_owned()
}

/// Absolute, symlink-free form of a path that may not exist yet.
///
/// The longest existing ancestor is canonicalized and the rest is appended
/// with `.` and `..` folded lexically.
#[must_use]
pub fn absolutize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    let mut ancestor = absolute.as_path();
    while !ancestor.exists() {
        match ancestor.parent() {
            Some(p) => ancestor = p,
            None => break,
        }
    }
    let base = ancestor
        .canonicalize()
        .unwrap_or_else(|_| ancestor.to_path_buf());

    let mut resolved = base;
    if let Ok(remainder) = absolute.strip_prefix(ancestor) {
        for component in remainder.components() {
            match component {
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::CurDir => {}
                other => resolved.push(other),
            }
        }
    }
    resolved
}

/// Fails when the destination is, contains, or lies inside a source root.
///
/// # Errors
///
/// Returns [`SliceError::DestinationOverlapsSource`] naming the first
/// conflicting root.
pub fn check_destination(destination: &Path, source_roots: &[PathBuf]) -> Result<(), SliceError> {
    let dest = absolutize(destination);
    for root in source_roots {
        let src = absolutize(root);
        if dest.starts_with(&src) || src.starts_with(&dest) {
            return Err(SliceError::DestinationOverlapsSource {
                destination: destination.to_path_buf(),
                source_root: root.clone(),
            });
        }
    }
    Ok(())
}

/// A report path located on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    /// Where the file is read from.
    pub source: PathBuf,
    /// Path relative to its source root; also its path under the destination.
    pub relative: PathBuf,
}

/// Locates a coverage report path.
///
/// Absolute paths must lie under one of the roots. Relative paths are
/// import-relative: the first root containing the file wins.
///
/// # Errors
///
/// Returns [`SliceError::UnresolvedPath`] if no root holds the file.
pub fn resolve_report_path(
    report_path: &Path,
    source_roots: &[PathBuf],
) -> Result<ResolvedSource, SliceError> {
    if report_path.is_absolute() {
        for root in source_roots {
            let candidates = [root.clone(), absolutize(root)];
            for candidate in &candidates {
                if let Ok(relative) = report_path.strip_prefix(candidate) {
                    return Ok(ResolvedSource {
                        source: report_path.to_path_buf(),
                        relative: relative.to_path_buf(),
                    });
                }
            }
        }
        return Err(SliceError::UnresolvedPath(report_path.to_path_buf()));
    }

    if report_path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(SliceError::UnresolvedPath(report_path.to_path_buf()));
    }
    source_roots
        .iter()
        .map(|root| root.join(report_path))
        .find(|candidate| candidate.is_file())
        .map(|source| ResolvedSource {
            source,
            relative: report_path.to_path_buf(),
        })
        .ok_or_else(|| SliceError::UnresolvedPath(report_path.to_path_buf()))
}

/// Package directory of a relative source path, `/`-separated.
#[must_use]
pub fn package_dir(relative: &Path) -> String {
    let dir = relative.parent().unwrap_or_else(|| Path::new(""));
    let shown = normalize_display_path(dir);
    if shown.is_empty() {
        ".".to_owned()
    } else {
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_overlap_rejected_both_ways() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();

        let inside = src.join("out");
        assert!(check_destination(&inside, &[src.clone()]).is_err());
        assert!(check_destination(dir.path(), &[src.clone()]).is_err());
        assert!(check_destination(&src, &[src.clone()]).is_err());
        assert!(check_destination(&dir.path().join("out"), &[src]).is_ok());
    }

    #[test]
    fn test_relative_report_path_uses_first_matching_root() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::create_dir_all(b.join("P")).unwrap();
        fs::create_dir_all(&a).unwrap();
        fs::write(b.join("P/P.go"), "package P\n").unwrap();

        let resolved = resolve_report_path(Path::new("P/P.go"), &[a, b.clone()]).unwrap();
        assert_eq!(resolved.source, b.join("P/P.go"));
        assert_eq!(resolved.relative, PathBuf::from("P/P.go"));
    }

    #[test]
    fn test_absolute_report_path_strips_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let file = root.join("slicer/P/P.go");

        let resolved = resolve_report_path(&file, &[root]).unwrap();
        assert_eq!(resolved.relative, PathBuf::from("slicer/P/P.go"));
    }

    #[test]
    fn test_unresolved_paths() {
        let dir = tempfile::tempdir().unwrap();
        let roots = [dir.path().to_path_buf()];
        assert!(resolve_report_path(Path::new("missing.go"), &roots).is_err());
        assert!(resolve_report_path(Path::new("../escape.go"), &roots).is_err());
        assert!(resolve_report_path(Path::new("/elsewhere/x.go"), &roots).is_err());
    }

    #[test]
    fn test_package_dir() {
        assert_eq!(package_dir(Path::new("slicer/P/P.go")), "slicer/P");
        assert_eq!(package_dir(Path::new("main.go")), ".");
    }
}
