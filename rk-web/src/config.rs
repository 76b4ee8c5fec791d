//! Service configuration for rk-web
//!
//! Combines command-line overrides, environment variables and the TOML file
//! into one [`ServiceConfig`]. Priority per setting: CLI → ENV → TOML →
//! compiled default.

use rk_common::config::{
    is_valid_key, resolve_credential, resolve_database_path, resolve_root_folder, TomlConfig,
    BIND_ADDRESS_ENV, DEFAULT_BIND_ADDRESS, GROQ_API_KEY_ENV, OMDB_API_KEY_ENV,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Movie-metadata provider (OMDb-compatible)
pub const DEFAULT_OMDB_URL: &str = "http://www.omdbapi.com/";

/// Market-quote provider (Yahoo Finance quote-summary)
pub const DEFAULT_QUOTE_URL: &str = "https://query2.finance.yahoo.com";

/// Sets the session cookie the quote service checks alongside the crumb
pub const DEFAULT_QUOTE_SESSION_URL: &str = "https://fc.yahoo.com";

/// Geocoder (Nominatim-compatible search endpoint)
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Forecast service (weather.gov-compatible)
pub const DEFAULT_FORECAST_URL: &str = "https://api.weather.gov";

/// Hosted language model (OpenAI-compatible)
pub const DEFAULT_CHAT_URL: &str = "https://api.groq.com/openai/v1";

/// Default language model
pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";

/// Sent on every outbound request; Nominatim and weather.gov reject anonymous clients
pub const USER_AGENT: &str = concat!("RecordKeeper/", env!("CARGO_PKG_VERSION"));

/// Values given on the command line (already merged with clap `env` fallbacks)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub provider_timeout_secs: Option<u64>,
}

/// Endpoints, timeout and credential for the three enrichment providers
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub timeout: Duration,
    pub omdb_url: String,
    pub quote_url: String,
    pub quote_session_url: String,
    pub geocode_url: String,
    pub forecast_url: String,
    pub omdb_api_key: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(rk_common::config::DEFAULT_PROVIDER_TIMEOUT_SECS),
            omdb_url: DEFAULT_OMDB_URL.to_string(),
            quote_url: DEFAULT_QUOTE_URL.to_string(),
            quote_session_url: DEFAULT_QUOTE_SESSION_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            omdb_api_key: None,
        }
    }
}

/// Language-model endpoint settings
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CHAT_URL.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            api_key: None,
            // completions routinely take longer than a provider lookup
            timeout: Duration::from_secs(30),
        }
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub bind_address: String,
    pub log_level: String,
    pub providers: ProviderSettings,
    pub chat: ChatSettings,
}

impl ServiceConfig {
    /// Resolve every setting from its sources
    pub fn resolve(cli: &CliOverrides, toml: &TomlConfig) -> Self {
        let root_folder = resolve_root_folder(cli.root_folder.as_deref(), toml);
        let database_path =
            resolve_database_path(cli.database_path.as_deref(), &root_folder, toml);

        let bind_address = cli
            .bind_address
            .clone()
            .or_else(|| std::env::var(BIND_ADDRESS_ENV).ok().filter(|a| is_valid_key(a)))
            .or_else(|| toml.bind_address.clone())
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let timeout_secs = cli
            .provider_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or_else(|| toml.provider_timeout_secs());

        let endpoint = |value: &Option<String>, default: &str| -> String {
            value
                .as_deref()
                .filter(|v| is_valid_key(v))
                .unwrap_or(default)
                .to_string()
        };

        let providers = ProviderSettings {
            timeout: Duration::from_secs(timeout_secs),
            omdb_url: endpoint(&toml.endpoints.omdb, DEFAULT_OMDB_URL),
            quote_url: endpoint(&toml.endpoints.quote, DEFAULT_QUOTE_URL),
            quote_session_url: endpoint(&toml.endpoints.quote_session, DEFAULT_QUOTE_SESSION_URL),
            geocode_url: endpoint(&toml.endpoints.geocode, DEFAULT_GEOCODE_URL),
            forecast_url: endpoint(&toml.endpoints.forecast, DEFAULT_FORECAST_URL),
            omdb_api_key: resolve_credential(OMDB_API_KEY_ENV, toml.omdb_api_key.as_deref()),
        };

        let chat = ChatSettings {
            base_url: endpoint(&toml.endpoints.chat, DEFAULT_CHAT_URL),
            model: endpoint(&toml.chat_model, DEFAULT_CHAT_MODEL),
            api_key: resolve_credential(GROQ_API_KEY_ENV, toml.groq_api_key.as_deref()),
            ..ChatSettings::default()
        };

        Self {
            root_folder,
            database_path,
            bind_address,
            log_level: toml.logging.level.clone(),
            providers,
            chat,
        }
    }

    /// Log the resolved configuration, credentials redacted
    pub fn log_summary(&self) {
        info!("Root folder: {}", self.root_folder.display());
        info!("Database: {}", self.database_path.display());
        info!(
            timeout_secs = self.providers.timeout.as_secs(),
            omdb = %self.providers.omdb_url,
            quote = %self.providers.quote_url,
            quote_session = %self.providers.quote_session_url,
            geocode = %self.providers.geocode_url,
            forecast = %self.providers.forecast_url,
            "Provider endpoints"
        );
        info!(
            omdb_key = self.providers.omdb_api_key.is_some(),
            groq_key = self.chat.api_key.is_some(),
            model = %self.chat.model,
            "Credentials configured"
        );
    }
}
