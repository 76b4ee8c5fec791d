//! Record enrichment workflow
//!
//! `enrich(kind, id)`: read the row, hand its natural key to the kind's
//! provider, and on success overwrite the whole enrichable column set in a
//! single UPDATE. Any failure leaves the row untouched.
//!
//! There is no locking and no idempotency guard. Two concurrent enrichments
//! of one row both write; the later UPDATE wins.

use rk_common::config::OMDB_API_KEY_ENV;
use serde::Serialize;
use sqlx::SqliteConnection;
use thiserror::Error;
use tracing::info;

use crate::db::store;
use crate::providers::{Enrichment, ProviderError, ProviderRegistry};
use crate::records::{EntityKind, NaturalKey, Record};

/// Why an enrichment did not happen
#[derive(Debug, Error)]
pub enum EnrichError {
    /// No row with this id; the provider was not called
    #[error("{kind} record {id} not found")]
    RecordNotFound { kind: EntityKind, id: i64 },

    /// The provider has no entry for the natural key
    #[error("{kind} provider has no match for '{natural_key}'")]
    ProviderNotFound {
        kind: EntityKind,
        natural_key: String,
        #[source]
        source: ProviderError,
    },

    /// Timeout, connection, rate limit, malformed answer or HTTP status
    #[error("{kind} provider failed for '{natural_key}': {source}")]
    Provider {
        kind: EntityKind,
        natural_key: String,
        #[source]
        source: ProviderError,
    },

    /// Missing credential or no adapter registered
    #[error("configuration error: {message}")]
    Configuration { kind: EntityKind, message: String },

    /// Read or write failed in the store
    #[error(transparent)]
    Store(rk_common::Error),
}

impl EnrichError {
    /// Text shown to the user
    pub fn user_message(&self) -> String {
        match self {
            EnrichError::RecordNotFound { kind, .. } => kind.not_found_message().to_string(),
            EnrichError::ProviderNotFound {
                kind, natural_key, ..
            }
            | EnrichError::Provider {
                kind, natural_key, ..
            } => provider_failure_message(*kind, natural_key),
            EnrichError::Configuration { message, .. } => message.clone(),
            EnrichError::Store(rk_common::Error::StoreUnavailable(_)) => {
                "Database connection failed.".to_string()
            }
            EnrichError::Store(err) => format!("Database error: {}", err),
        }
    }

    /// Provider failure class, if a provider was involved
    pub fn provider_class(&self) -> Option<&'static str> {
        match self {
            EnrichError::ProviderNotFound { source, .. } | EnrichError::Provider { source, .. } => {
                Some(source.class())
            }
            _ => None,
        }
    }
}

fn provider_failure_message(kind: EntityKind, natural_key: &str) -> String {
    match kind {
        EntityKind::Movie => format!(
            "Could not fetch data for '{}' from OMDB API. The movie may not exist in OMDB database.",
            natural_key
        ),
        EntityKind::Ticker => format!("Could not fetch live price for {}.", natural_key),
        EntityKind::Weather => format!("Could not fetch live weather for {}.", natural_key),
    }
}

fn missing_credential_message(var: &str) -> String {
    if var == OMDB_API_KEY_ENV {
        "OMDB API key is not configured. Please set OMDB_API_KEY in environment variables."
            .to_string()
    } else {
        format!(
            "{} is not configured. Please set {} in environment variables.",
            var, var
        )
    }
}

/// Outcome of a successful enrichment
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentReport {
    pub kind: EntityKind,
    pub id: i64,
    pub natural_key: NaturalKey,
    pub enrichment: Enrichment,
    /// Row as stored after the update
    pub record: Record,
}

impl EnrichmentReport {
    /// Text shown to the user
    pub fn message(&self) -> String {
        match &self.enrichment {
            Enrichment::Movie(_) => format!(
                "Movie data fetched and updated for '{}'!",
                self.natural_key.key
            ),
            Enrichment::Quote { price } => {
                format!("Price updated for {}: ${:.2}", self.natural_key.key, price)
            }
            Enrichment::Forecast { temperature } => format!(
                "Weather updated for {}: {:.1}°F",
                self.natural_key.key, temperature
            ),
        }
    }
}

/// Enrich one row from its provider
pub async fn enrich(
    conn: &mut SqliteConnection,
    providers: &ProviderRegistry,
    kind: EntityKind,
    id: i64,
) -> Result<EnrichmentReport, EnrichError> {
    let record = store::get(conn, kind, id)
        .await
        .map_err(|e| store_error(kind, id, e))?;
    let natural_key = record.natural_key();

    let adapter = providers.get(kind).ok_or_else(|| EnrichError::Configuration {
        kind,
        message: format!("No provider is configured for {}.", kind),
    })?;

    let enrichment = adapter
        .fetch(&natural_key)
        .await
        .map_err(|source| provider_error(kind, &natural_key, source))?;

    if enrichment.kind() != kind {
        return Err(EnrichError::Provider {
            kind,
            natural_key: natural_key.key.clone(),
            source: ProviderError::MalformedResponse(format!(
                "{} adapter returned a {} result",
                adapter.name(),
                enrichment.kind()
            )),
        });
    }

    store::update(conn, kind, id, &enrichment.fields())
        .await
        .map_err(|e| store_error(kind, id, e))?;

    let record = store::get(conn, kind, id)
        .await
        .map_err(|e| store_error(kind, id, e))?;

    info!(
        kind = %kind,
        id,
        key = %natural_key.key,
        provider = adapter.name(),
        summary = %enrichment.summary(),
        "Record enriched"
    );

    Ok(EnrichmentReport {
        kind,
        id,
        natural_key,
        enrichment,
        record,
    })
}

fn store_error(kind: EntityKind, id: i64, err: rk_common::Error) -> EnrichError {
    match err {
        rk_common::Error::NotFound(_) => EnrichError::RecordNotFound { kind, id },
        other => EnrichError::Store(other),
    }
}

fn provider_error(kind: EntityKind, key: &NaturalKey, source: ProviderError) -> EnrichError {
    match source {
        ProviderError::MissingCredential(var) => EnrichError::Configuration {
            kind,
            message: missing_credential_message(var),
        },
        source if source.is_not_found() => EnrichError::ProviderNotFound {
            kind,
            natural_key: key.key.clone(),
            source,
        },
        source => EnrichError::Provider {
            kind,
            natural_key: key.key.clone(),
            source,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = EnrichError::RecordNotFound {
            kind: EntityKind::Weather,
            id: 3,
        };
        assert_eq!(err.user_message(), "Weather record not found.");

        let err = provider_error(
            EntityKind::Ticker,
            &NaturalKey::new("ZZZZ", None),
            ProviderError::NotFound("no price".into()),
        );
        assert_eq!(err.user_message(), "Could not fetch live price for ZZZZ.");
        assert_eq!(err.provider_class(), Some("not_found"));

        let err = provider_error(
            EntityKind::Movie,
            &NaturalKey::new("Heat", None),
            ProviderError::MissingCredential(OMDB_API_KEY_ENV),
        );
        assert!(matches!(err, EnrichError::Configuration { .. }));
        assert_eq!(
            err.user_message(),
            "OMDB API key is not configured. Please set OMDB_API_KEY in environment variables."
        );
    }

    #[test]
    fn test_transient_failure_is_provider_error() {
        let err = provider_error(
            EntityKind::Weather,
            &NaturalKey::new("Atlanta", Some("Georgia".into())),
            ProviderError::Timeout("forecast request".into()),
        );
        assert!(matches!(err, EnrichError::Provider { .. }));
        assert_eq!(err.provider_class(), Some("timeout"));
        assert_eq!(err.user_message(), "Could not fetch live weather for Atlanta.");
    }
}
