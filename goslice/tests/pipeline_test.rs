//! End-to-end tests for the slicing pipeline with a scripted oracle.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use goslice::coverage::CoverageReport;
use goslice::error::SliceError;
use goslice::oracle::{
    Diagnostic, DiagnosticSet, FlaggedObject, ObjectKind, OracleError, Program, UnusedOracle,
};
use goslice::pipeline::{SliceOptions, Slicer};
use goslice::position::PositionError;
use tempfile::{tempdir, TempDir};

type Step = Box<dyn FnMut(&Program) -> Result<Vec<FlaggedObject>, OracleError>>;

/// Answers each evaluation with the next scripted step; clean once exhausted.
struct ScriptedOracle {
    steps: VecDeque<Step>,
    calls: usize,
}

impl ScriptedOracle {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            calls: 0,
        }
    }
}

impl UnusedOracle for ScriptedOracle {
    fn evaluate(&mut self, program: &Program) -> Result<Vec<FlaggedObject>, OracleError> {
        self.calls += 1;
        match self.steps.pop_front() {
            Some(mut step) => step(program),
            None => Ok(Vec::new()),
        }
    }
}

/// Offset of `needle` in a written file, shifted by `skip` bytes.
fn offset_in(file: &Path, needle: &str, skip: usize) -> usize {
    let text = fs::read_to_string(file).unwrap();
    text.find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not found in {}", file.display()))
        + skip
}

fn flag(program: &Program, rel: &str, needle: &str, skip: usize, kind: ObjectKind, name: &str) -> FlaggedObject {
    let file = program.root.join(rel);
    FlaggedObject {
        name: name.to_owned(),
        kind,
        offset: offset_in(&file, needle, skip),
        file,
    }
}

fn diagnostic(program: &Program, rel: &str, needle: &str, message: &str, soft: bool) -> Diagnostic {
    let file = program.root.join(rel);
    Diagnostic {
        package: "p".to_owned(),
        offset: offset_in(&file, needle, 0),
        file,
        line: 1,
        column: 1,
        message: message.to_owned(),
        soft,
    }
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self { dir: tempdir().unwrap() }
    }

    fn source_root(&self) -> PathBuf {
        self.dir.path().join("src")
    }

    fn destination(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn write(&self, rel: &str, text: &str) {
        let path = self.source_root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn output(&self, rel: &str) -> String {
        fs::read_to_string(self.destination().join(rel)).unwrap()
    }

    fn slicer(&self) -> Slicer {
        Slicer::new(SliceOptions::new(vec![self.source_root()], self.destination())).unwrap()
    }
}

const MAIN_GO: &str = "package main

func main() {
\tif false {
\t\tdoWork()
\t}
\tdone()
}

func doWork() {
\tprintln(\"work\")
}

func done() {
\tprintln(\"done\")
}
";

#[test]
fn test_dead_branch_and_its_callee_are_removed() {
    let ws = Workspace::new();
    ws.write("app/main.go", MAIN_GO);
    let report = CoverageReport::parse_str("app/main.go\n#4:11,6:3\n#10:15,12:2\n").unwrap();

    let mut oracle = ScriptedOracle::new(vec![Box::new(|program: &Program| {
        Ok(vec![flag(program, "app/main.go", "func doWork", 5, ObjectKind::Func, "doWork")])
    })]);
    let summary = ws.slicer().run(&report, Some(&mut oracle)).unwrap();

    let out = ws.output("app/main.go");
    assert!(!out.contains("if false"));
    assert!(!out.contains("doWork"));
    assert!(out.contains("func main() {\n\tdone()\n}"));
    assert!(out.contains("func done() {\n\tprintln(\"done\")\n}"));

    assert_eq!(summary.packages, vec!["app".to_owned()]);
    assert_eq!(summary.rounds, 2);
    assert_eq!(summary.objects_removed, 1);
    assert_eq!(oracle.calls, 2);
}

#[test]
fn test_unused_local_is_blanked_after_soft_diagnostic() {
    let ws = Workspace::new();
    ws.write("p/p.go", "package p\n\nfunc F() (err error) {\n\tx := 1\n\treturn\n}\n");
    let report = CoverageReport::parse_str("p/p.go\n").unwrap();

    let mut oracle = ScriptedOracle::new(vec![Box::new(|program: &Program| {
        let set: DiagnosticSet = [diagnostic(program, "p/p.go", "x :=", "declared and not used: x", true)]
            .into_iter()
            .collect();
        Err(OracleError::Diagnostics(set))
    })]);
    let summary = ws.slicer().run(&report, Some(&mut oracle)).unwrap();

    assert_eq!(
        ws.output("p/p.go"),
        "package p\n\nfunc F() (err error) {\n\t_ = 1\n\treturn\n}\n"
    );
    assert_eq!(summary.soft_diagnostics, 1);
    assert_eq!(summary.fix_edits, 2);
    assert_eq!(summary.rounds, 2);
}

#[test]
fn test_hard_diagnostic_aborts_in_first_round() {
    let ws = Workspace::new();
    ws.write("p/p.go", "package p\n\nfunc F() int {\n\treturn undefined\n}\n");
    let report = CoverageReport::parse_str("p/p.go\n").unwrap();

    let mut oracle = ScriptedOracle::new(vec![Box::new(|program: &Program| {
        let set: DiagnosticSet = [diagnostic(program, "p/p.go", "undefined", "undefined: undefined", false)]
            .into_iter()
            .collect();
        Err(OracleError::Diagnostics(set))
    })]);
    let err = ws.slicer().run(&report, Some(&mut oracle)).unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("static analysis reported 1 error(s)"));
    assert!(message.contains("undefined: undefined"));
    match err {
        SliceError::HardDiagnostics(set) => assert_eq!(set.hard_count(), 1),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(oracle.calls, 1);
}

#[test]
fn test_round_cap_reports_no_fixed_point() {
    let ws = Workspace::new();
    ws.write("app/main.go", MAIN_GO);
    let report = CoverageReport::parse_str("app/main.go\n#4:11,6:3\n#10:15,12:2\n").unwrap();

    let mut options = SliceOptions::new(vec![ws.source_root()], ws.destination());
    options.max_rounds = 1;
    let mut oracle = ScriptedOracle::new(vec![Box::new(|program: &Program| {
        Ok(vec![flag(program, "app/main.go", "func doWork", 5, ObjectKind::Func, "doWork")])
    })]);
    let err = Slicer::new(options).unwrap().run(&report, Some(&mut oracle)).unwrap_err();

    assert!(matches!(
        err,
        SliceError::NoFixedPoint { rounds: 1, remaining: 1 }
    ));
}

#[test]
fn test_fix_round_without_progress_stops() {
    let ws = Workspace::new();
    ws.write("p/p.go", "package p\n\nfunc F() {\n}\n");
    let report = CoverageReport::parse_str("p/p.go\n").unwrap();

    let mut oracle = ScriptedOracle::new(vec![Box::new(|program: &Program| {
        // Points at the package clause; nothing there can be blanked.
        let set: DiagnosticSet = [diagnostic(program, "p/p.go", "package", "declared and not used: p", true)]
            .into_iter()
            .collect();
        Err(OracleError::Diagnostics(set))
    })]);
    let err = ws.slicer().run(&report, Some(&mut oracle)).unwrap_err();

    assert!(matches!(err, SliceError::NoFixedPoint { rounds: 1, .. }));
}

#[test]
fn test_label_left_unused_by_pruning_is_stripped() {
    let ws = Workspace::new();
    ws.write(
        "p/p.go",
        "package p

func F(xs []int) {
outer:
\tfor range xs {
\t\tif stop() {
\t\t\tbreak outer
\t\t}
\t\tg()
\t}
}
",
    );
    let report = CoverageReport::parse_str("p/p.go\n#6:13,8:4\n").unwrap();

    let mut oracle = ScriptedOracle::new(vec![Box::new(|program: &Program| {
        let set: DiagnosticSet = [diagnostic(program, "p/p.go", "outer:", "label outer defined and not used", true)]
            .into_iter()
            .collect();
        Err(OracleError::Diagnostics(set))
    })]);
    let summary = ws.slicer().run(&report, Some(&mut oracle)).unwrap();

    assert_eq!(
        ws.output("p/p.go"),
        "package p\n\nfunc F(xs []int) {\n\tfor range xs {\n\t\tg()\n\t}\n}\n"
    );
    assert_eq!(summary.rounds, 2);
}

#[test]
fn test_unlocatable_objects_are_fatal() {
    let ws = Workspace::new();
    ws.write("p/p.go", "package p\n\nfunc F() {\n\ttype t int\n\tvar _ t\n}\n");
    let report = CoverageReport::parse_str("p/p.go\n").unwrap();

    // Local types are out of reach of declaration-level pruning.
    let mut oracle = ScriptedOracle::new(vec![Box::new(|program: &Program| {
        Ok(vec![flag(program, "p/p.go", "type t", 5, ObjectKind::Type, "t")])
    })]);
    let err = ws.slicer().run(&report, Some(&mut oracle)).unwrap_err();

    assert!(matches!(
        err,
        SliceError::NoFixedPoint { rounds: 1, remaining: 1 }
    ));
    assert_eq!(oracle.calls, 1);
}

#[test]
fn test_loop_with_empty_body_survives() {
    let ws = Workspace::new();
    ws.write(
        "p/p.go",
        "package p\n\nfunc Wait(ready func() bool) {\n\tfor !ready() {\n\t}\n\tdone()\n}\n\nfunc done() {}\n",
    );
    let report = CoverageReport::parse_str("p/p.go\n#6:2,6:8\n").unwrap();

    ws.slicer().run(&report, None).unwrap();

    assert_eq!(
        ws.output("p/p.go"),
        "package p\n\nfunc Wait(ready func() bool) {\n\tfor !ready() {\n\t}\n}\n\nfunc done() {}\n"
    );
}

#[test]
fn test_backend_failure_is_fatal() {
    let ws = Workspace::new();
    ws.write("p/p.go", "package p\n");
    let report = CoverageReport::parse_str("p/p.go\n").unwrap();

    let mut oracle = ScriptedOracle::new(vec![Box::new(|_: &Program| {
        Err(OracleError::Backend("analyzer not installed".to_owned()))
    })]);
    let err = ws.slicer().run(&report, Some(&mut oracle)).unwrap_err();
    assert!(matches!(err, SliceError::Oracle(message) if message.contains("not installed")));
}

#[test]
fn test_dead_type_takes_methods_from_other_files() {
    let ws = Workspace::new();
    ws.write("p/types.go", "package p\n\ntype T struct{}\n\nfunc Keep() {}\n");
    ws.write("p/methods.go", "package p\n\nfunc (t *T) M() {}\n\nfunc (t T) N() {}\n");
    let report = CoverageReport::parse_str("p/types.go\np/methods.go\n").unwrap();

    let mut oracle = ScriptedOracle::new(vec![Box::new(|program: &Program| {
        Ok(vec![flag(program, "p/types.go", "type T", 5, ObjectKind::Type, "T")])
    })]);
    ws.slicer().run(&report, Some(&mut oracle)).unwrap();

    let types = ws.output("p/types.go");
    assert!(!types.contains("type T"));
    assert!(types.contains("func Keep() {}"));
    let methods = ws.output("p/methods.go");
    assert!(!methods.contains("M()"));
    assert!(!methods.contains("N()"));
}

#[test]
fn test_structural_pass_without_oracle() {
    let ws = Workspace::new();
    ws.write("app/main.go", MAIN_GO);
    let report = CoverageReport::parse_str("app/main.go\n#4:11,6:3\n").unwrap();

    let summary = ws.slicer().run(&report, None).unwrap();

    assert_eq!(summary.rounds, 0);
    assert_eq!(summary.uncovered_ranges, 1);
    assert_eq!(summary.files_written, vec![PathBuf::from("app/main.go")]);
    let out = ws.output("app/main.go");
    assert!(!out.contains("if false"));
    assert!(out.contains("func doWork() {\n\tprintln(\"work\")\n}"));
}

#[test]
fn test_sources_are_never_modified() {
    let ws = Workspace::new();
    ws.write("app/main.go", MAIN_GO);
    let report = CoverageReport::parse_str("app/main.go\n#4:11,6:3\n#10:15,12:2\n").unwrap();

    ws.slicer().run(&report, None).unwrap();
    let original = fs::read_to_string(ws.source_root().join("app/main.go")).unwrap();
    assert_eq!(original, MAIN_GO);
}

#[test]
fn test_file_with_nothing_left_is_dropped() {
    let ws = Workspace::new();
    ws.write("p/dead.go", "package p\n\nvar x = 1\n");
    ws.write("p/live.go", "package p\n\nvar y = 2\n");
    let report = CoverageReport::parse_str("p/dead.go\n#3:1,3:10\np/live.go\n").unwrap();

    let summary = ws.slicer().run(&report, None).unwrap();

    assert_eq!(summary.files_dropped, vec![PathBuf::from("p/dead.go")]);
    assert!(!ws.destination().join("p/dead.go").exists());
    assert_eq!(ws.output("p/live.go"), "package p\n\nvar y = 2\n");
}

#[test]
fn test_destination_inside_source_is_rejected() {
    let ws = Workspace::new();
    let options = SliceOptions::new(vec![ws.source_root()], ws.source_root().join("out"));
    assert!(matches!(
        Slicer::new(options),
        Err(SliceError::DestinationOverlapsSource { .. })
    ));
}

#[test]
fn test_unknown_file_is_unresolved() {
    let ws = Workspace::new();
    ws.write("p/p.go", "package p\n");
    let report = CoverageReport::parse_str("q/q.go\n").unwrap();
    let err = ws.slicer().run(&report, None).unwrap_err();
    assert!(matches!(err, SliceError::UnresolvedPath(path) if path == Path::new("q/q.go")));
}

#[test]
fn test_position_past_end_of_file() {
    let ws = Workspace::new();
    ws.write("p/p.go", "package p\n");
    let report = CoverageReport::parse_str("p/p.go\n#40:1,41:1\n").unwrap();
    let err = ws.slicer().run(&report, None).unwrap_err();
    assert!(matches!(err, SliceError::Position { .. }));
}

#[test]
fn test_inverted_range_is_rejected() {
    let ws = Workspace::new();
    ws.write("p/p.go", "package p\n\nvar x = 1\n");
    let report = CoverageReport::parse_str("p/p.go\n#3:5,1:1\n").unwrap();
    let err = ws.slicer().run(&report, None).unwrap_err();
    assert!(matches!(
        err,
        SliceError::Position {
            source: PositionError::Inverted { .. },
            ..
        }
    ));
}
