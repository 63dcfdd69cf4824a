//! Command-line interface parsing for quotecache
//!
//! Two modes are supported: `-i <file>` initializes a new database file, and a
//! positional `<file>` starts the web service on an existing one. With neither,
//! usage is printed.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::server::StaticFiles;

/// Text printed when no mode was selected
pub const USAGE: &str = "Usage:

Start webservice using database file:
\tquotecache <quotes.db>

Initialize new database file:
\tquotecache -i <quotes.db>
";

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// Serving requires an API key that was not supplied
    #[error("Missing API key: pass --{flag} or set {env}")]
    MissingApiKey {
        flag: &'static str,
        env: &'static str,
    },
}

/// quotecache - equity and precious metal quotes over HTTP
#[derive(Parser, Debug)]
#[command(name = "quotecache")]
#[command(about = "Equity and precious metal quote service with an upstream-shielding cache")]
#[command(version)]
pub struct Cli {
    /// Create and initialize a new database file
    #[arg(short = 'i', long = "init", value_name = "FILE")]
    pub init: Option<PathBuf>,

    /// Existing database file to serve from
    #[arg(value_name = "DB_FILE")]
    pub database: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "QUOTECACHE_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Alpha Vantage API key for equity overviews and prices
    #[arg(long, env = "ALPHAVANTAGE_API_KEY", hide_env_values = true)]
    pub alphavantage_key: Option<String>,

    /// GoldAPI access token for metal spot prices
    #[arg(long, env = "GOLDAPI_API_KEY", hide_env_values = true)]
    pub goldapi_key: Option<String>,

    /// Directory served under /static/ (also holds the favicon)
    #[arg(long, value_name = "DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Directory served for all other paths
    #[arg(long, value_name = "DIR", default_value = "public")]
    pub web_root: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, value_name = "FILTER", default_value = "info")]
    pub log_level: String,
}

/// Settings needed to run the web service
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub database: PathBuf,
    pub port: u16,
    pub alphavantage_key: String,
    pub goldapi_key: String,
    pub static_files: StaticFiles,
    pub log_level: String,
}

/// What the process should do, derived from CLI arguments
#[derive(Debug, Clone)]
pub enum StartupConfig {
    /// Print usage and exit
    Usage,
    /// Create a new database file
    Init(PathBuf),
    /// Serve from an existing database file
    Serve(ServeConfig),
}

/// Returns the value of an API key, rejecting missing or blank ones
fn require_key(
    value: &Option<String>,
    flag: &'static str,
    env: &'static str,
) -> Result<String, CliError> {
    match value.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(CliError::MissingApiKey { flag, env }),
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// `-i` wins over a positional database file, so `quotecache -i new.db old.db`
    /// only initializes `new.db`.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with the selected mode
    /// * `Err(CliError)` if serving was requested without both API keys
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if let Some(path) = &cli.init {
            return Ok(StartupConfig::Init(path.clone()));
        }

        let Some(database) = &cli.database else {
            return Ok(StartupConfig::Usage);
        };

        Ok(StartupConfig::Serve(ServeConfig {
            database: database.clone(),
            port: cli.port,
            alphavantage_key: require_key(
                &cli.alphavantage_key,
                "alphavantage-key",
                "ALPHAVANTAGE_API_KEY",
            )?,
            goldapi_key: require_key(&cli.goldapi_key, "goldapi-key", "GOLDAPI_API_KEY")?,
            static_files: StaticFiles::new(&cli.static_dir, &cli.web_root),
            log_level: cli.log_level.clone(),
        }))
    }
}
