use regex::Regex;
use std::sync::OnceLock;

/// Name of the project-level configuration file.
pub const CONFIG_FILENAME: &str = ".goslice.toml";

/// The binding name Go exempts from unused-binding diagnostics.
pub const DISCARD_IDENT: &str = "_";

/// Default cap on oracle evaluations per run.
pub const DEFAULT_MAX_ROUNDS: usize = 8;

/// Diagnostic code the default oracle command uses for unused objects.
pub const DEFAULT_UNUSED_CODE: &str = "U1000";

/// Diagnostic code under which the oracle forwards compiler errors.
pub const COMPILE_CODE: &str = "compile";

/// Default oracle command line; package patterns are appended.
pub const DEFAULT_ORACLE_COMMAND: &[&str] = &["staticcheck", "-f", "json", "-checks", "U1000"];

/// Regex for one uncovered range line of a coverage report: `#l0:c0,l1:c1`.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn get_range_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"^#(\d+):(\d+),(\d+):(\d+)$").expect("Invalid coverage range regex pattern")
    })
}

/// Compiler messages that slicing produces as an expected side effect.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn get_soft_diagnostic_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(
            r"declared and not used|declared but not used|defined and not used|imported and not used|imported but not used|no new variables on left side of :=",
        )
        .expect("Invalid soft diagnostic regex pattern")
    })
}

/// Unused-object message: `func helper is unused`, `func (*T).m is unused`.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn get_unused_object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"^(func|type|field|const|var|import) (\S+) is unused")
            .expect("Invalid unused object regex pattern")
    })
}

/// Node kinds that the pruner treats as switch-like dispatchers.
pub const DISPATCH_KINDS: &[&str] = &[
    "expression_switch_statement",
    "type_switch_statement",
    "select_statement",
];

/// Node kinds of case clauses inside a dispatcher.
pub const CASE_KINDS: &[&str] = &[
    "expression_case",
    "type_case",
    "communication_case",
    "default_case",
];
