use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::CONFIG_FILENAME;

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The main configuration section for goslice.
    pub goslice: GoSliceConfig,
    /// The path to the configuration file this was loaded from.
    /// Set during `load_from_path`, `None` if using defaults or programmatic config.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
/// Configuration options for goslice.
pub struct GoSliceConfig {
    /// Roots that coverage report paths are relative to.
    pub source_roots: Option<Vec<PathBuf>>,
    /// Root the sliced program is written to.
    pub destination: Option<PathBuf>,
    /// Extra package paths always included in the oracle query.
    pub packages: Option<Vec<String>>,
    /// Cap on oracle evaluations.
    pub max_rounds: Option<usize>,
    /// Oracle command line; package patterns are appended.
    pub oracle_command: Option<Vec<String>>,
    /// Diagnostic code the oracle uses for unused objects.
    pub unused_code: Option<String>,
    /// Re-parse every emitted file before writing it.
    pub verify_output: Option<bool>,
}

impl GoSliceConfig {
    /// Makes relative `source_roots` and `destination` relative to `base`,
    /// the directory holding the configuration file.
    #[must_use]
    pub fn anchored_at(mut self, base: &Path) -> Self {
        let anchor = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };
        self.source_roots = self
            .source_roots
            .map(|roots| roots.into_iter().map(anchor).collect());
        self.destination = self.destination.map(anchor);
        self
    }
}

impl Config {
    /// Loads configuration from the current directory or its ancestors.
    #[must_use]
    pub fn load() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_from_path(&cwd)
    }

    /// Loads configuration starting from a specific path and traversing up.
    ///
    /// A file that exists but does not parse is skipped with a warning.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }

        loop {
            let goslice_toml = current.join(CONFIG_FILENAME);
            if goslice_toml.exists() {
                match fs::read_to_string(&goslice_toml)
                    .map_err(|e| e.to_string())
                    .and_then(|content| toml::from_str::<Config>(&content).map_err(|e| e.to_string()))
                {
                    Ok(mut config) => {
                        let base = goslice_toml.parent().unwrap_or(Path::new("."));
                        config.goslice = config.goslice.anchored_at(base);
                        config.config_file_path = Some(goslice_toml);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!(file = %goslice_toml.display(), error = %e, "ignoring unreadable configuration");
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        Config::default()
    }
}
