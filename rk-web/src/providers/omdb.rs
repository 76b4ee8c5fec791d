//! OMDb movie-metadata adapter
//!
//! Looks a movie up by exact title:
//! `GET <base>?apikey=<key>&t=<title>&type=movie&plot=full`
//!
//! OMDb answers HTTP 200 for misses too, with `"Response": "False"` and an
//! `Error` text, so the body decides between found and not found.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{
    classify_request_error, log_outcome, parse_json, status_error, Enrichment, MovieDetails,
    ProviderAdapter, ProviderError,
};
use crate::records::{EntityKind, NaturalKey};
use rk_common::config::OMDB_API_KEY_ENV;

/// Placeholder OMDb uses for unknown values
const NOT_AVAILABLE: &str = "N/A";

/// OMDb title lookup
pub struct OmdbClient {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// Subset of the OMDb title response we read
#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "Director")]
    director: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Plot")]
    plot: Option<String>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
    #[serde(rename = "Actors")]
    actors: Option<String>,
    #[serde(rename = "Genre")]
    genre: Option<String>,
}

impl OmdbClient {
    pub fn new(http_client: Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            http_client,
            base_url,
            api_key,
        }
    }

    async fn lookup(&self, title: &str) -> Result<Enrichment, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential(OMDB_API_KEY_ENV))?;

        debug!(title = %title, "Querying OMDb");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("apikey", api_key),
                ("t", title),
                ("type", "movie"),
                ("plot", "full"),
            ])
            .send()
            .await
            .map_err(|e| classify_request_error(e, "OMDb request"))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(format!("OMDb has no title '{}'", title)));
        }
        if !status.is_success() {
            return Err(status_error(response, "OMDb").await);
        }

        let body: OmdbResponse = parse_json(response, "OMDb response").await?;
        map_response(title, body)
    }
}

fn map_response(title: &str, body: OmdbResponse) -> Result<Enrichment, ProviderError> {
    match body.response.as_deref() {
        Some("True") => {}
        Some("False") => {
            let reason = body.error.unwrap_or_else(|| "Unknown error".to_string());
            return Err(ProviderError::NotFound(format!("{}: {}", title, reason)));
        }
        _ => {
            return Err(ProviderError::MalformedResponse(
                "OMDb response lacks a Response flag".to_string(),
            ))
        }
    }

    let poster = body
        .poster
        .filter(|p| p != NOT_AVAILABLE)
        .unwrap_or_default();

    Ok(Enrichment::Movie(MovieDetails {
        director: body.director.unwrap_or_default(),
        year: parse_year(body.year.as_deref())?,
        plot: body.plot.unwrap_or_default(),
        poster,
        actors: body.actors.unwrap_or_default(),
        genre: body.genre.unwrap_or_default(),
    }))
}

/// First year of an OMDb year field
///
/// Series carry ranges such as `"1990–1993"` or open ranges `"2019–"`;
/// the start year is kept. `"N/A"` or absent yields `None`.
pub fn parse_year(raw: Option<&str>) -> Result<Option<i64>, ProviderError> {
    let raw = match raw.map(str::trim) {
        None | Some("") | Some(NOT_AVAILABLE) => return Ok(None),
        Some(raw) => raw,
    };

    let first = raw.split('–').next().unwrap_or(raw).trim();
    first
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ProviderError::MalformedResponse(format!("unparseable year '{}'", raw)))
}

#[async_trait]
impl ProviderAdapter for OmdbClient {
    fn name(&self) -> &'static str {
        "omdb"
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Movie
    }

    async fn fetch(&self, key: &NaturalKey) -> Result<Enrichment, ProviderError> {
        let outcome = self.lookup(&key.key).await;
        log_outcome(self.name(), key, &outcome);
        outcome
    }
}
