use crate::cli::{Cli, LogLevel};
use crate::config::{Config, GoSliceConfig};
use crate::constants::{DEFAULT_MAX_ROUNDS, DEFAULT_ORACLE_COMMAND, DEFAULT_UNUSED_CODE};
use crate::coverage::CoverageReport;
use crate::oracle::{CommandOracle, UnusedOracle};
use crate::pipeline::{SliceOptions, Slicer};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Installs the stderr `tracing` subscriber. `RUST_LOG` overrides `level`.
///
/// Installing twice (as in-process tests do) keeps the first subscriber.
pub fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Merges command-line flags over the configuration file; defaults apply last.
///
/// # Errors
///
/// Returns an error when no destination is given anywhere.
pub fn build_options(cli: &Cli, config: &GoSliceConfig) -> Result<SliceOptions> {
    let destination = cli
        .destination
        .clone()
        .or_else(|| config.destination.clone())
        .context("no destination given; pass --destination or set `destination` in .goslice.toml")?;

    let source_roots = if cli.source_roots.is_empty() {
        config
            .source_roots
            .clone()
            .unwrap_or_else(|| vec![PathBuf::from(".")])
    } else {
        cli.source_roots.clone()
    };

    let mut packages = config.packages.clone().unwrap_or_default();
    packages.extend(cli.oracle.packages.iter().cloned());

    let mut options = SliceOptions::new(source_roots, destination);
    options.packages = packages;
    options.max_rounds = cli
        .oracle
        .max_rounds
        .or(config.max_rounds)
        .unwrap_or(DEFAULT_MAX_ROUNDS);
    options.verify_output = cli.verify || config.verify_output.unwrap_or(false);
    Ok(options)
}

/// The oracle to run, or `None` with `--no-oracle`.
///
/// # Errors
///
/// Returns an error for an empty oracle command.
pub fn build_oracle(cli: &Cli, config: &GoSliceConfig) -> Result<Option<CommandOracle>> {
    if cli.oracle.no_oracle {
        return Ok(None);
    }
    let command: Vec<String> = match (&cli.oracle.oracle_cmd, &config.oracle_command) {
        (Some(cmd), _) => cmd.split_whitespace().map(str::to_owned).collect(),
        (None, Some(cmd)) => cmd.clone(),
        (None, None) => DEFAULT_ORACLE_COMMAND.iter().map(|s| (*s).to_owned()).collect(),
    };
    let unused_code = config
        .unused_code
        .clone()
        .unwrap_or_else(|| DEFAULT_UNUSED_CODE.to_owned());
    let oracle = CommandOracle::new(&command, unused_code).context("invalid oracle command")?;
    Ok(Some(oracle))
}

fn read_report(path: &Path) -> Result<CoverageReport> {
    if path == Path::new("-") {
        let stdin = std::io::stdin();
        return CoverageReport::parse(stdin.lock()).context("reading coverage report from stdin");
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open coverage report {}", path.display()))?;
    CoverageReport::parse(BufReader::new(file))
        .with_context(|| format!("reading coverage report {}", path.display()))
}

/// Run goslice with the given arguments.
///
/// # Errors
///
/// Returns an error if the slicing run fails.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Run goslice with the given arguments, writing the report to `writer`.
///
/// This is the testable version of `run_with_args` that allows output capture.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete, the report cannot
/// be read, or the slicing run fails. Argument errors are printed and
/// reported as exit code 2.
pub fn run_with_args_to<W: Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["goslice".to_owned()];
    program_args.extend(args);
    let cli = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                write!(writer, "{e}")?;
                writer.flush()?;
                return Ok(0);
            }
            _ => {
                eprint!("{e}");
                return Ok(2);
            }
        },
    };

    init_tracing(cli.log_level());

    let config = Config::load();
    if let Some(path) = &config.config_file_path {
        tracing::info!(file = %path.display(), "using configuration");
    }

    let options = build_options(&cli, &config.goslice)?;
    let mut oracle = build_oracle(&cli, &config.goslice)?;
    let report = read_report(&cli.report)?;
    tracing::info!(
        files = report.files.len(),
        ranges = report.range_count(),
        "coverage report loaded"
    );

    let destination = options.destination.clone();
    let mut slicer = Slicer::new(options).context("invalid slicing options")?;
    let summary = slicer
        .run(&report, oracle.as_mut().map(|o| o as &mut dyn UnusedOracle))
        .context("slicing failed")?;

    if cli.output.json {
        crate::output::print_json(writer, &summary)?;
    } else {
        crate::output::print_report(writer, &destination, &summary)?;
    }
    writer.flush()?;
    Ok(0)
}
