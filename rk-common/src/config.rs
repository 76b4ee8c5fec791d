//! Configuration loading and root folder resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (handled by the binaries)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "RK_ROOT_FOLDER";

/// Environment variable overriding the database file location
pub const DATABASE_PATH_ENV: &str = "RK_DATABASE_PATH";

/// Environment variable overriding the HTTP listen address
pub const BIND_ADDRESS_ENV: &str = "RK_BIND_ADDRESS";

/// Credential for the movie-metadata provider
pub const OMDB_API_KEY_ENV: &str = "OMDB_API_KEY";

/// Credential for the hosted language model
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default HTTP listen address
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5780";

/// Default timeout for every outbound provider call
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "recordkeeper.db";

/// Bootstrap configuration loaded from TOML
///
/// All keys are optional; a missing file is treated as an empty one.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Folder holding the database (and anything else we persist)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database file, overrides `<root_folder>/recordkeeper.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP listen address, e.g. "127.0.0.1:5780"
    #[serde(default)]
    pub bind_address: Option<String>,

    /// Timeout in seconds for each outbound provider request
    #[serde(default)]
    pub provider_timeout_secs: Option<u64>,

    /// Movie-metadata provider credential
    #[serde(default)]
    pub omdb_api_key: Option<String>,

    /// Language-model credential
    #[serde(default)]
    pub groq_api_key: Option<String>,

    /// Language model used by the chat page
    #[serde(default)]
    pub chat_model: Option<String>,

    /// Provider base URL overrides
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Base URL overrides for the external services
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub omdb: Option<String>,
    #[serde(default)]
    pub quote: Option<String>,
    /// Page that issues the quote service's session cookie
    #[serde(default)]
    pub quote_session: Option<String>,
    #[serde(default)]
    pub geocode: Option<String>,
    #[serde(default)]
    pub forecast: Option<String>,
    #[serde(default)]
    pub chat: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Provider timeout, falling back to the compiled default
    pub fn provider_timeout_secs(&self) -> u64 {
        self.provider_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS)
    }
}

/// Default location of the TOML config file
///
/// `~/.config/recordkeeper/config.toml` on Linux, the platform config dir elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("recordkeeper").join("config.toml"))
}

/// Load the TOML config
///
/// An explicitly requested file must exist. The default location is
/// optional: if absent, an empty config is returned and startup continues.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using environment and defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config = TomlConfig::from_toml_str(&content)?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Resolve the root folder (CLI → ENV → TOML → OS default)
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("recordkeeper"))
        .unwrap_or_else(|| PathBuf::from("./recordkeeper_data"))
}

/// Resolve the database file (CLI → ENV → TOML → `<root>/recordkeeper.db`)
pub fn resolve_database_path(
    cli_arg: Option<&Path>,
    root_folder: &Path,
    toml_config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATABASE_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    toml_config
        .database_path
        .clone()
        .unwrap_or_else(|| root_folder.join(DATABASE_FILE_NAME))
}

/// Resolve an API credential (ENV → TOML)
///
/// Returns `None` when no valid key is configured. Callers decide whether
/// that is fatal; the web service keeps running and reports a configuration
/// error when the credential is actually needed.
pub fn resolve_credential(env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_value.filter(|k| is_valid_key(k)).map(str::to_string);

    match (env_key, toml_key) {
        (Some(env_key), Some(_)) => {
            warn!(
                "{} found in both environment and TOML config. Using environment.",
                env_var
            );
            Some(env_key.trim().to_string())
        }
        (Some(env_key), None) => {
            info!("{} loaded from environment variable", env_var);
            Some(env_key.trim().to_string())
        }
        (None, Some(toml_key)) => {
            info!("{} loaded from TOML config", env_var);
            Some(toml_key.trim().to_string())
        }
        (None, None) => None,
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
