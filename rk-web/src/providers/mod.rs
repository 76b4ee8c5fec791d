//! Provider adapters
//!
//! One adapter per entity kind translates a natural key into a request
//! against an external service and maps the answer onto that kind's
//! enrichable columns. All adapters share the [`ProviderAdapter`] contract:
//! a single attempt, bounded by the client timeout, no retries.
//!
//! | Kind    | Adapter          | Service                      |
//! |---------|------------------|------------------------------|
//! | movie   | [`OmdbClient`]   | OMDb-compatible title lookup |
//! | ticker  | [`QuoteClient`]  | Yahoo quote-summary (crumb)  |
//! | weather | [`ForecastClient`] | Nominatim + weather.gov    |

pub mod forecast;
pub mod omdb;
pub mod quote;

pub use forecast::ForecastClient;
pub use omdb::OmdbClient;
pub use quote::QuoteClient;

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ProviderSettings, USER_AGENT};
use crate::records::{EntityKind, Fields, NaturalKey, Value};

/// Fields a movie lookup fills in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieDetails {
    pub director: String,
    pub year: Option<i64>,
    pub plot: String,
    pub poster: String,
    pub actors: String,
    pub genre: String,
}

/// A successful provider answer, already mapped onto record columns
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum Enrichment {
    Movie(MovieDetails),
    Quote { price: f64 },
    Forecast { temperature: f64 },
}

impl Enrichment {
    pub fn kind(&self) -> EntityKind {
        match self {
            Enrichment::Movie(_) => EntityKind::Movie,
            Enrichment::Quote { .. } => EntityKind::Ticker,
            Enrichment::Forecast { .. } => EntityKind::Weather,
        }
    }

    /// The complete enrichable column set for this kind
    pub fn fields(&self) -> Fields {
        match self {
            Enrichment::Movie(m) => Fields::new()
                .with("director", Value::text(m.director.clone()))
                .with("year", m.year.map(Value::Integer).unwrap_or(Value::Null))
                .with("plot", Value::text(m.plot.clone()))
                .with("poster", Value::text(m.poster.clone()))
                .with("actors", Value::text(m.actors.clone()))
                .with("genre", Value::text(m.genre.clone())),
            Enrichment::Quote { price } => Fields::new().with("price", Value::Real(*price)),
            Enrichment::Forecast { temperature } => {
                Fields::new().with("temperature", Value::Real(*temperature))
            }
        }
    }

    /// One-line description of the new value
    pub fn summary(&self) -> String {
        match self {
            Enrichment::Movie(m) => match m.year {
                Some(year) => format!("{} ({}), directed by {}", m.genre, year, m.director),
                None => format!("{}, directed by {}", m.genre, m.director),
            },
            Enrichment::Quote { price } => format!("${:.2}", price),
            Enrichment::Forecast { temperature } => format!("{:.1}°F", temperature),
        }
    }
}

/// Why a provider call produced no enrichment
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider has no entry for this key
    #[error("not found: {0}")]
    NotFound(String),

    /// Required credential is not configured
    #[error("{0} is not configured")]
    MissingCredential(&'static str),

    /// No response within the client timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Could not reach the provider
    #[error("connection failed: {0}")]
    Connection(String),

    /// Forecast service does not cover these coordinates
    #[error("location not supported: {0}")]
    UnsupportedLocation(String),

    /// Provider answered HTTP 429
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Response lacked an expected key or could not be parsed
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Any other non-success HTTP status
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl ProviderError {
    /// Stable failure class name for logs and API bodies
    pub fn class(&self) -> &'static str {
        match self {
            ProviderError::NotFound(_) => "not_found",
            ProviderError::MissingCredential(_) => "missing_credential",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Connection(_) => "connection",
            ProviderError::UnsupportedLocation(_) => "unsupported_location",
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::MalformedResponse(_) => "malformed_response",
            ProviderError::Status { .. } => "http_status",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }

    /// Failures that might succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            ProviderError::NotFound(_) | ProviderError::MissingCredential(_)
        )
    }
}

/// Sort a transport failure into a failure class
pub(crate) fn classify_request_error(err: reqwest::Error, context: &str) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(format!("{}: {}", context, err))
    } else if err.is_decode() {
        ProviderError::MalformedResponse(format!("{}: {}", context, err))
    } else {
        ProviderError::Connection(format!("{}: {}", context, err))
    }
}

/// Turn a non-success response into a failure class
///
/// 404 handling differs per provider, so callers check it before this.
pub(crate) async fn status_error(response: Response, context: &str) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::RateLimited(context.to_string());
    }
    ProviderError::Status {
        status: status.as_u16(),
        body: truncate(&body, 200),
    }
}

/// Parse a JSON body into a strict record type
pub(crate) async fn parse_json<T: serde::de::DeserializeOwned>(
    response: Response,
    context: &str,
) -> Result<T, ProviderError> {
    let raw = response
        .text()
        .await
        .map_err(|e| classify_request_error(e, context))?;
    serde_json::from_str(&raw).map_err(|e| {
        ProviderError::MalformedResponse(format!(
            "{}: {} (body: {})",
            context,
            e,
            truncate(&raw, 200)
        ))
    })
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

fn client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );

    Client::builder().timeout(timeout).default_headers(headers)
}

/// Build the HTTP client shared by the stateless adapters
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    client_builder(timeout).build()
}

/// Client with a cookie jar, for providers that tie requests to a session
pub fn build_session_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    client_builder(timeout).cookie_store(true).build()
}

/// Contract shared by every enrichment provider
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Entity kind this adapter enriches
    fn kind(&self) -> EntityKind;

    /// Look up one natural key
    async fn fetch(&self, key: &NaturalKey) -> Result<Enrichment, ProviderError>;
}

/// Log a finished fetch: failures at warn with their class, successes at debug
pub(crate) fn log_outcome(
    provider: &str,
    key: &NaturalKey,
    outcome: &Result<Enrichment, ProviderError>,
) {
    match outcome {
        Ok(enrichment) => debug!(
            provider,
            key = %key.key,
            summary = %enrichment.summary(),
            "Provider lookup succeeded"
        ),
        Err(err) => warn!(
            provider,
            key = %key.key,
            class = err.class(),
            error = %err,
            "Provider lookup failed"
        ),
    }
}

/// Adapter per entity kind
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<EntityKind, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the three production adapters sharing one client
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, reqwest::Error> {
        let client = build_http_client(settings.timeout)?;

        let mut registry = Self::new();
        registry.register(Arc::new(OmdbClient::new(
            client.clone(),
            settings.omdb_url.clone(),
            settings.omdb_api_key.clone(),
        )));
        registry.register(Arc::new(QuoteClient::new(
            build_session_client(settings.timeout)?,
            settings.quote_url.clone(),
            settings.quote_session_url.clone(),
        )));
        registry.register(Arc::new(ForecastClient::new(
            client,
            settings.geocode_url.clone(),
            settings.forecast_url.clone(),
        )));
        Ok(registry)
    }

    /// Install an adapter, replacing any earlier one for its kind
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) -> &mut Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    pub fn get(&self, kind: EntityKind) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&kind).cloned()
    }
}
