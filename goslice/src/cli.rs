use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.goslice.toml):
  Create this file in your project root to set defaults.
  Relative paths are taken relative to the file's directory.

  [goslice]
  source_roots = [\"src\"]       # Roots report paths are relative to
  destination = \"sliced\"       # Output root (must not overlap a source root)
  packages = [\"cmd/tool\"]      # Extra packages for the oracle query
  max_rounds = 8               # Cap on oracle evaluations
  oracle_command = [\"staticcheck\", \"-f\", \"json\", \"-checks\", \"U1000\"]
  unused_code = \"U1000\"        # Code the oracle uses for unused objects
  verify_output = false        # Re-parse every emitted file

REPORT FORMAT:
  One line naming a source file, then one `#l0:c0,l1:c1` line per
  region that never executed. Use `-` to read the report from stdin.
";

/// Log verbosity for tracing output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Every edit and range.
    Trace,
    /// Per-file decisions.
    Debug,
    /// Phases and rounds.
    Info,
    /// Skipped work only.
    #[default]
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// The matching `tracing` level.
    #[must_use]
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Options for the unused-symbol oracle.
#[derive(Args, Debug, Default, Clone)]
pub struct OracleOptions {
    /// Oracle command line (whitespace separated); package patterns are appended.
    #[arg(long = "oracle-cmd", value_name = "CMD")]
    pub oracle_cmd: Option<String>,

    /// Stop after the structural pass; never run the oracle.
    #[arg(long, conflicts_with = "oracle_cmd")]
    pub no_oracle: bool,

    /// Maximum number of oracle evaluations.
    #[arg(long, value_name = "N")]
    pub max_rounds: Option<usize>,

    /// Extra package paths (relative to the destination) for the oracle query.
    #[arg(short = 'p', long = "package", value_name = "PATH")]
    pub packages: Vec<String>,
}

/// Options for output formatting and verbosity.
#[derive(Args, Debug, Default, Clone)]
pub struct OutputOptions {
    /// Print the run summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output for debugging (same as --log-level debug).
    #[arg(short, long)]
    pub verbose: bool,

    /// Log level for tracing output (`RUST_LOG` takes precedence).
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

/// Command line interface configuration using `clap`.
/// This struct defines the arguments and flags accepted by the program.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "goslice - Shrink a Go program to the code one execution actually ran",
    long_about = None,
    after_help = CONFIG_HELP
)]
pub struct Cli {
    /// Zero-count coverage report (`-` reads stdin).
    pub report: PathBuf,

    /// Roots that report paths are relative to (repeatable, in priority order).
    #[arg(short = 's', long = "source-root", value_name = "DIR")]
    pub source_roots: Vec<PathBuf>,

    /// Root the sliced program is written to.
    #[arg(short = 'd', long, value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Re-parse every rewritten file and refuse to write broken output.
    #[arg(long)]
    pub verify: bool,

    /// Oracle options.
    #[command(flatten)]
    pub oracle: OracleOptions,

    /// Output formatting options.
    #[command(flatten)]
    pub output: OutputOptions,
}

impl Cli {
    /// Effective log level once `--verbose` is taken into account.
    #[must_use]
    pub fn log_level(&self) -> LogLevel {
        if self.output.verbose && self.output.log_level == LogLevel::Warn {
            LogLevel::Debug
        } else {
            self.output.log_level
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "goslice",
            "-s",
            "src",
            "-s",
            "vendor",
            "-d",
            "out",
            "-p",
            "cmd/tool",
            "--max-rounds",
            "3",
            "--oracle-cmd",
            "staticcheck -f json",
            "--json",
            "-v",
            "report.txt",
        ])
        .unwrap();

        assert_eq!(cli.source_roots.len(), 2);
        assert_eq!(cli.destination, Some(PathBuf::from("out")));
        assert_eq!(cli.oracle.packages, vec!["cmd/tool".to_owned()]);
        assert_eq!(cli.oracle.max_rounds, Some(3));
        assert!(cli.output.json);
        assert_eq!(cli.log_level(), LogLevel::Debug);
        assert_eq!(cli.report, PathBuf::from("report.txt"));
    }

    #[test]
    fn test_no_oracle_conflicts_with_command() {
        let result = Cli::try_parse_from([
            "goslice",
            "--no-oracle",
            "--oracle-cmd",
            "staticcheck",
            "report.txt",
        ]);
        assert!(result.is_err());
    }
}
