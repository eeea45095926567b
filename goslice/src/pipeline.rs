//! The slicing pipeline.
//!
//! 1. **Structural pass**: every file named in the coverage report is
//!    pruned by [`RangePruner`] and written under the destination root.
//! 2. **Settle loop**: the oracle is consulted on the written packages.
//!    Soft diagnostics are neutralized by [`DeclarationFixer`], unused
//!    objects are deleted by [`DeadObjectPruner`], and the oracle runs
//!    again until an evaluation is clean and reports nothing removable.
//!
//! Sources are only ever read; every write goes below the destination.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::constants::DEFAULT_MAX_ROUNDS;
use crate::coverage::CoverageReport;
use crate::cst::{CstTree, GoParser};
use crate::error::SliceError;
use crate::fix::{ByteRangeRewriter, Edit};
use crate::oracle::{DiagnosticSet, FlaggedObject, ObjectKind, OracleError, Program, UnusedOracle};
use crate::position::{ByteRange, PositionIndex};
use crate::slice::{DeadObjectPruner, DeclarationFixer, PruneOutcome, RangePruner};
use crate::utils::{absolutize, check_destination, normalize_display_path, package_dir, resolve_report_path};

/// Everything a run needs; nothing is read from globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceOptions {
    /// Roots that report paths are resolved against, in priority order.
    pub source_roots: Vec<PathBuf>,
    /// Root the sliced program is written to.
    pub destination: PathBuf,
    /// Packages added to every oracle query, relative to the destination.
    pub packages: Vec<String>,
    /// Cap on oracle evaluations.
    pub max_rounds: usize,
    /// Re-parse each rewritten file and refuse to write broken output.
    pub verify_output: bool,
}

impl SliceOptions {
    /// Options with default round cap and no extra packages.
    #[must_use]
    pub fn new(source_roots: Vec<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source_roots,
            destination: destination.into(),
            packages: Vec::new(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            verify_output: false,
        }
    }

    /// Checks the options before any file is touched.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::DestinationOverlapsSource`] when the
    /// destination and a source root overlap.
    pub fn validate(&self) -> Result<(), SliceError> {
        check_destination(&self.destination, &self.source_roots)
    }
}

/// What a run did, for the end-of-run report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SliceSummary {
    /// Files written, relative to the destination.
    pub files_written: Vec<PathBuf>,
    /// Files whose every declaration was pruned; not written.
    pub files_dropped: Vec<PathBuf>,
    /// Uncovered ranges read from the report.
    pub uncovered_ranges: usize,
    /// Edits applied by the structural pass.
    pub structural_edits: usize,
    /// Packages handed to the oracle.
    pub packages: Vec<String>,
    /// Oracle evaluations performed.
    pub rounds: usize,
    /// Soft diagnostics seen across all rounds.
    pub soft_diagnostics: usize,
    /// Edits applied by the fixer.
    pub fix_edits: usize,
    /// Unused objects reported and removed.
    pub objects_removed: usize,
}

/// Drives one slicing run.
pub struct Slicer {
    options: SliceOptions,
    parser: GoParser,
}

impl Slicer {
    /// Validates the options and prepares the parser.
    ///
    /// # Errors
    ///
    /// Fails when the options are invalid or the Go grammar cannot be loaded.
    pub fn new(options: SliceOptions) -> Result<Self, SliceError> {
        options.validate()?;
        let parser = GoParser::new().map_err(|e| SliceError::Parse {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;
        Ok(Self { options, parser })
    }

    /// The options this slicer runs with.
    #[must_use]
    pub fn options(&self) -> &SliceOptions {
        &self.options
    }

    /// Structural pass followed, when an oracle is given, by the settle loop.
    ///
    /// # Errors
    ///
    /// Any [`SliceError`]; all of them abort the run.
    pub fn run(
        &mut self,
        report: &CoverageReport,
        oracle: Option<&mut dyn UnusedOracle>,
    ) -> Result<SliceSummary, SliceError> {
        let mut summary = self.slice(report)?;
        if let Some(oracle) = oracle {
            self.settle(oracle, &mut summary)?;
        }
        Ok(summary)
    }

    /// Prunes every reported file and writes the survivors.
    ///
    /// # Errors
    ///
    /// Fails on unresolvable paths, positions outside their file, unparsable
    /// sources and I/O errors.
    pub fn slice(&mut self, report: &CoverageReport) -> Result<SliceSummary, SliceError> {
        tracing::info!(files = report.files.len(), "slicing by coverage");
        let mut summary = SliceSummary::default();
        let mut packages = FxHashSet::default();

        for file in &report.files {
            let resolved = resolve_report_path(&file.path, &self.options.source_roots)?;
            let source = fs::read_to_string(&resolved.source)
                .map_err(|e| SliceError::io(&resolved.source, e))?;

            let index = PositionIndex::new(&source);
            let ranges = file
                .uncovered
                .iter()
                .map(|r| {
                    let range = index.byte_range(r).map_err(|e| SliceError::Position {
                        path: resolved.source.clone(),
                        source: e,
                    })?;
                    tracing::debug!(file = %resolved.relative.display(), %r, bytes = %range, "uncovered");
                    Ok(range)
                })
                .collect::<Result<Vec<ByteRange>, SliceError>>()?;
            summary.uncovered_ranges += ranges.len();

            let tree = self.parse(&resolved.source, &source)?;
            let target = self.options.destination.join(&resolved.relative);

            match RangePruner::new(&tree, &ranges).prune() {
                PruneOutcome::Empty => {
                    tracing::info!(file = %normalize_display_path(&resolved.relative), "nothing survived; not emitted");
                    if target.is_file() {
                        fs::remove_file(&target).map_err(|e| SliceError::io(&target, e))?;
                    }
                    summary.files_dropped.push(resolved.relative);
                }
                PruneOutcome::Kept(edits) => {
                    summary.structural_edits += edits.len();
                    let text = self.rewrite(&target, &source, edits)?;
                    write_file(&target, &text)?;
                    packages.insert(package_dir(&resolved.relative));
                    summary.files_written.push(resolved.relative);
                }
            }
        }

        packages.extend(self.options.packages.iter().cloned());
        let mut packages: Vec<String> = packages.into_iter().collect();
        packages.sort();
        summary.packages = packages;
        Ok(summary)
    }

    /// Runs the oracle until the written program reaches a fixed point.
    ///
    /// # Errors
    ///
    /// [`SliceError::HardDiagnostics`] as soon as one hard diagnostic shows
    /// up, [`SliceError::NoFixedPoint`] when the round cap is reached or a
    /// fix round makes no progress, [`SliceError::Oracle`] when the oracle
    /// itself fails.
    pub fn settle(
        &mut self,
        oracle: &mut dyn UnusedOracle,
        summary: &mut SliceSummary,
    ) -> Result<(), SliceError> {
        let program = Program {
            root: absolutize(&self.options.destination),
            packages: summary.packages.clone(),
        };
        let mut outstanding = 0usize;

        loop {
            if summary.rounds >= self.options.max_rounds {
                return Err(SliceError::NoFixedPoint {
                    rounds: summary.rounds,
                    remaining: outstanding,
                });
            }
            summary.rounds += 1;
            tracing::info!(round = summary.rounds, "evaluating program");

            match oracle.evaluate(&program) {
                Err(OracleError::Backend(message)) => return Err(SliceError::Oracle(message)),
                Err(OracleError::Diagnostics(set)) => {
                    if set.hard_count() > 0 {
                        for diagnostic in set.hard() {
                            tracing::error!(package = %diagnostic.package, "{diagnostic}");
                        }
                        return Err(SliceError::HardDiagnostics(set));
                    }
                    summary.soft_diagnostics += set.len();
                    let edits = self.fix_soft(&program.root, &set)?;
                    if edits == 0 {
                        return Err(SliceError::NoFixedPoint {
                            rounds: summary.rounds,
                            remaining: set.len(),
                        });
                    }
                    summary.fix_edits += edits;
                    outstanding = set.len();
                }
                Ok(objects) if objects.is_empty() => {
                    tracing::info!(rounds = summary.rounds, "fixed point reached");
                    return Ok(());
                }
                Ok(objects) => {
                    let located = self.prune_dead(&program.root, summary, &objects)?;
                    if located == 0 {
                        for object in &objects {
                            tracing::error!(kind = %object.kind, name = %object.name, file = %object.file.display(), offset = object.offset, "unused object not found in source");
                        }
                        return Err(SliceError::NoFixedPoint {
                            rounds: summary.rounds,
                            remaining: objects.len(),
                        });
                    }
                    if located < objects.len() {
                        tracing::warn!(located, reported = objects.len(), "some unused objects were not found");
                    }
                    summary.objects_removed += located;
                    outstanding = objects.len();
                }
            }
        }
    }

    fn fix_soft(&mut self, root: &Path, set: &DiagnosticSet) -> Result<usize, SliceError> {
        let mut total = 0;
        for (file, offsets) in set.soft_offsets_by_file() {
            let file = ensure_within(root, &file)?;
            tracing::debug!(file = %file.display(), ?offsets, "fixing soft diagnostics");
            let source = fs::read_to_string(&file).map_err(|e| SliceError::io(&file, e))?;
            let tree = self.parse(&file, &source)?;
            let edits = DeclarationFixer::new(&tree).fix(&offsets);
            total += self.apply(&file, &source, edits)?;
        }
        Ok(total)
    }

    /// Removes the flagged objects; returns how many were found and removed.
    fn prune_dead(
        &mut self,
        root: &Path,
        summary: &SliceSummary,
        objects: &[FlaggedObject],
    ) -> Result<usize, SliceError> {
        let mut by_file: BTreeMap<PathBuf, Vec<FlaggedObject>> = BTreeMap::new();
        let mut dead_types: FxHashMap<PathBuf, FxHashSet<String>> = FxHashMap::default();
        for object in objects {
            tracing::debug!(kind = %object.kind, name = %object.name, file = %object.file.display(), offset = object.offset, "unused");
            let file = ensure_within(root, &object.file)?;
            if object.kind == ObjectKind::Type {
                let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
                dead_types.entry(dir).or_default().insert(object.name.clone());
            }
            by_file.entry(file).or_default().push(object.clone());
        }

        // Methods may live in other files of the unused type's package.
        for relative in &summary.files_written {
            let file = root.join(relative);
            let in_dead_package = file
                .parent()
                .is_some_and(|dir| dead_types.contains_key(dir));
            if in_dead_package {
                by_file.entry(file).or_default();
            }
        }

        let no_types = FxHashSet::default();
        let mut located = 0;
        for (file, file_objects) in &by_file {
            let source = fs::read_to_string(file).map_err(|e| SliceError::io(file, e))?;
            let tree = self.parse(file, &source)?;
            let types = file
                .parent()
                .and_then(|dir| dead_types.get(dir))
                .unwrap_or(&no_types);
            let edits = DeadObjectPruner::new(&tree, file, file_objects, types).prune()?;
            located += file_objects
                .iter()
                .filter(|o| edits.iter().any(|e| (e.start_byte..e.end_byte).contains(&o.offset)))
                .count();
            self.apply(file, &source, edits)?;
        }
        Ok(located)
    }

    /// Applies edits to `source` and writes `path`; returns the edit count.
    fn apply(&self, path: &Path, source: &str, edits: Vec<Edit>) -> Result<usize, SliceError> {
        if edits.is_empty() {
            return Ok(0);
        }
        let count = edits.len();
        let text = self.rewrite(path, source, edits)?;
        write_file(path, &text)?;
        Ok(count)
    }

    fn rewrite(&self, path: &Path, source: &str, edits: Vec<Edit>) -> Result<String, SliceError> {
        let mut rewriter = ByteRangeRewriter::new(source);
        rewriter.add_edits(edits);
        let result = if self.options.verify_output {
            rewriter.apply_verified()
        } else {
            rewriter.apply()
        };
        result.map_err(|source| SliceError::Rewrite {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(&mut self, path: &Path, source: &str) -> Result<CstTree, SliceError> {
        let tree = self.parser.parse(source).map_err(|e| SliceError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if let Some(offset) = tree.first_error() {
            let (line, column) = PositionIndex::new(source).line_col(offset);
            return Err(SliceError::Parse {
                path: path.to_path_buf(),
                reason: format!("syntax error at {line}:{column}"),
            });
        }
        Ok(tree)
    }
}

/// Oracle paths must point into the destination; sources are read-only.
fn ensure_within(root: &Path, file: &Path) -> Result<PathBuf, SliceError> {
    let absolute = absolutize(file);
    if absolute.starts_with(root) {
        Ok(absolute)
    } else {
        Err(SliceError::UnresolvedPath(file.to_path_buf()))
    }
}

fn write_file(path: &Path, text: &str) -> Result<(), SliceError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| SliceError::io(dir, e))?;
    }
    fs::write(path, text).map_err(|e| SliceError::io(path, e))
}
