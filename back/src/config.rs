//! Server configuration: an optional RON file, overridden by CLI flags and
//! `TALLY_*` environment variables.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use clap::Parser;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "tally.ron";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub database: PathBuf,
    /// Default `tracing` filter; `RUST_LOG` takes precedence.
    pub log: String,
    pub tls: Option<TlsConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 7890,
            database: PathBuf::from("tally.db"),
            log: String::from("info"),
            tls: None,
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults when the file doesn't exist.
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => eyre::bail!(err),
        };

        Self::parse(&text)
    }

    pub fn parse(text: &str) -> eyre::Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(database) = &cli.database {
            self.database = database.clone();
        }
        if let Some(log) = &cli.log {
            self.log = log.clone();
        }
        self
    }
}

#[derive(Clone, Debug, Parser)]
#[command(name = "tally", version, about = "Goals and tasks tracker server")]
pub struct Cli {
    /// RON configuration file.
    #[arg(long, env = "TALLY_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[arg(long, env = "TALLY_PORT")]
    pub port: Option<u16>,

    /// SQLite database file.
    #[arg(long, env = "TALLY_DATABASE")]
    pub database: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `tally_back=trace`.
    #[arg(long, env = "TALLY_LOG")]
    pub log: Option<String>,
}
