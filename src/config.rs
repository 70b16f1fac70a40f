pub use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::DumpError;
use crate::sink::OutputFormat;

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "utxodump.toml";

/// Resolved dump settings.
///
/// Layered lowest to highest: built-in defaults, the TOML settings file,
/// `UTXODUMP_*` environment variables, then command-line flags (applied by
/// the binary).
#[derive(Debug, Clone, Deserialize)]
pub struct DumpSettings {
    /// Node data directory, `~` expanded.
    pub datadir: String,
    /// Explicit chainstate directory; overrides `datadir` and `testnet`.
    pub chainstate_dir: Option<String>,
    pub testnet: bool,
    pub format: OutputFormat,
    /// Output file; stdout when unset.
    pub output: Option<String>,
    /// Log a progress line every this many records (0 disables).
    pub progress_interval: u64,
}

impl Default for DumpSettings {
    fn default() -> Self {
        DumpSettings {
            datadir: "~/.bitcoin".to_string(),
            chainstate_dir: None,
            testnet: false,
            format: OutputFormat::Csv,
            output: None,
            progress_interval: 1_000_000,
        }
    }
}

/// Load settings from `path` (required) or the default file (optional) and
/// the environment.
pub fn load_settings(path: Option<&Path>) -> Result<DumpSettings, DumpError> {
    let defaults = DumpSettings::default();
    let file = match path {
        Some(p) => ConfigFile::from(p).required(true),
        None => ConfigFile::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let config = Config::builder()
        .set_default("datadir", defaults.datadir)?
        .set_default("testnet", defaults.testnet)?
        .set_default("format", "csv")?
        .set_default("progress_interval", defaults.progress_interval as i64)?
        .add_source(file)
        .add_source(Environment::with_prefix("UTXODUMP"))
        .build()?;

    Ok(config.try_deserialize()?)
}

impl DumpSettings {
    /// Where the chainstate lives: the explicit directory if set, otherwise
    /// `<datadir>[/testnet3]/chainstate`.
    pub fn chainstate_path(&self) -> PathBuf {
        if let Some(dir) = &self.chainstate_dir {
            return PathBuf::from(shellexpand::tilde(dir).into_owned());
        }
        let mut path = PathBuf::from(shellexpand::tilde(&self.datadir).into_owned());
        if self.testnet {
            path.push("testnet3");
        }
        path.push("chainstate");
        path
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        self.output
            .as_ref()
            .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
    }
}
