//! Market-quote adapter (Yahoo Finance quote-summary)
//!
//! `GET <base>/v10/finance/quoteSummary/<SYMBOL>?modules=financialData,price&crumb=<crumb>`
//!
//! The endpoint only answers requests that carry a session cookie and the
//! crumb bound to it. The first lookup performs the handshake:
//! 1. `GET <session>` so the jar picks up the cookie (the status is ignored)
//! 2. `GET <base>/v1/test/getcrumb`, whose plain-text body is the crumb
//!
//! The crumb is cached for later lookups and dropped when the service
//! answers 401, so the next lookup starts a fresh session.
//!
//! The current price is read from `financialData.currentPrice.raw`, falling
//! back to `price.regularMarketPrice.raw`. Unknown symbols come back as 404
//! with a `"Not Found"` error code in the body.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    classify_request_error, log_outcome, parse_json, status_error, Enrichment, ProviderAdapter,
    ProviderError,
};
use crate::records::{EntityKind, NaturalKey};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryEnvelope {
    quote_summary: Option<QuoteSummary>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteModules>>,
    error: Option<QuoteError>,
}

#[derive(Debug, Deserialize)]
struct QuoteError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteModules {
    financial_data: Option<FinancialData>,
    price: Option<PriceModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    current_price: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    regular_market_price: Option<RawValue>,
}

/// Yahoo wraps numbers as `{"raw": 191.45, "fmt": "191.45"}`; empty `{}` when unknown
#[derive(Debug, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

/// Quote-summary client
///
/// Needs an HTTP client with a cookie store (see
/// [`build_session_client`](super::build_session_client)).
pub struct QuoteClient {
    http_client: Client,
    base_url: String,
    session_url: String,
    crumb: Mutex<Option<String>>,
}

impl QuoteClient {
    pub fn new(http_client: Client, base_url: String, session_url: String) -> Self {
        Self {
            http_client,
            base_url,
            session_url,
            crumb: Mutex::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Cached crumb, or a new one from a fresh session
    async fn crumb(&self) -> Result<String, ProviderError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        debug!(session_url = %self.session_url, "Opening quote session");
        self.http_client
            .get(&self.session_url)
            .send()
            .await
            .map_err(|e| classify_request_error(e, "quote session request"))?;

        let response = self
            .http_client
            .get(self.url("v1/test/getcrumb"))
            .send()
            .await
            .map_err(|e| classify_request_error(e, "crumb request"))?;
        if !response.status().is_success() {
            return Err(status_error(response, "crumb endpoint").await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_request_error(e, "crumb response"))?;
        let crumb = body.trim();
        if crumb.is_empty() || crumb.contains(char::is_whitespace) || crumb.contains('<') {
            return Err(ProviderError::MalformedResponse(format!(
                "unusable crumb: {:?}",
                crumb
            )));
        }

        *cached = Some(crumb.to_string());
        Ok(crumb.to_string())
    }

    async fn lookup(&self, symbol: &str) -> Result<Enrichment, ProviderError> {
        let symbol = symbol.trim().to_uppercase();
        let crumb = self.crumb().await?;
        let url = self.url(&format!("v10/finance/quoteSummary/{}", symbol));

        debug!(symbol = %symbol, "Querying quote summary");

        let response = self
            .http_client
            .get(&url)
            .query(&[("modules", "financialData,price"), ("crumb", crumb.as_str())])
            .send()
            .await
            .map_err(|e| classify_request_error(e, "quote request"))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            *self.crumb.lock().await = None;
        }

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(format!("no quote for {}", symbol)));
        }
        if !status.is_success() {
            return Err(status_error(response, "quote service").await);
        }

        let envelope: QuoteSummaryEnvelope = parse_json(response, "quote response").await?;
        extract_price(&symbol, envelope).map(|price| Enrichment::Quote { price })
    }
}

fn extract_price(symbol: &str, envelope: QuoteSummaryEnvelope) -> Result<f64, ProviderError> {
    let summary = envelope.quote_summary.ok_or_else(|| {
        ProviderError::MalformedResponse("response lacks quoteSummary".to_string())
    })?;

    if let Some(error) = summary.error {
        let code = error.code.unwrap_or_default();
        let description = error.description.unwrap_or_default();
        if code.eq_ignore_ascii_case("Not Found") {
            return Err(ProviderError::NotFound(format!("{}: {}", symbol, description)));
        }
        return Err(ProviderError::MalformedResponse(format!(
            "quote service error {}: {}",
            code, description
        )));
    }

    let modules = summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ProviderError::NotFound(format!("empty quote result for {}", symbol)))?;

    let current = modules
        .financial_data
        .and_then(|f| f.current_price)
        .and_then(|p| p.raw);
    let regular = modules
        .price
        .and_then(|p| p.regular_market_price)
        .and_then(|p| p.raw);

    // A zero price means "no data" on this API, so it falls through like a missing one
    current
        .filter(|p| p.is_finite() && *p > 0.0)
        .or_else(|| regular.filter(|p| p.is_finite() && *p > 0.0))
        .ok_or_else(|| ProviderError::NotFound(format!("no price data for {}", symbol)))
}

#[async_trait]
impl ProviderAdapter for QuoteClient {
    fn name(&self) -> &'static str {
        "quote"
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Ticker
    }

    async fn fetch(&self, key: &NaturalKey) -> Result<Enrichment, ProviderError> {
        let outcome = self.lookup(&key.key).await;
        log_outcome(self.name(), key, &outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: serde_json::Value) -> QuoteSummaryEnvelope {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_current_price_preferred() {
        let body = envelope(serde_json::json!({
            "quoteSummary": {
                "result": [{
                    "financialData": {"currentPrice": {"raw": 191.45, "fmt": "191.45"}},
                    "price": {"regularMarketPrice": {"raw": 190.0, "fmt": "190.00"}}
                }],
                "error": null
            }
        }));
        assert_eq!(extract_price("AAPL", body).unwrap(), 191.45);
    }

    #[test]
    fn test_falls_back_to_regular_market_price() {
        let body = envelope(serde_json::json!({
            "quoteSummary": {
                "result": [{
                    "financialData": {"currentPrice": {}},
                    "price": {"regularMarketPrice": {"raw": 102.5}}
                }],
                "error": null
            }
        }));
        assert_eq!(extract_price("VTSAX", body).unwrap(), 102.5);
    }

    #[test]
    fn test_no_price_is_not_found() {
        let body = envelope(serde_json::json!({
            "quoteSummary": {"result": [{"price": {}}], "error": null}
        }));
        assert!(extract_price("ZZZZ", body).unwrap_err().is_not_found());

        let body = envelope(serde_json::json!({"quoteSummary": {"result": [], "error": null}}));
        assert!(extract_price("ZZZZ", body).unwrap_err().is_not_found());
    }

    #[test]
    fn test_provider_not_found_error() {
        let body = envelope(serde_json::json!({
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for symbol: ZZZZ"}
            }
        }));
        assert!(extract_price("ZZZZ", body).unwrap_err().is_not_found());
    }

    #[test]
    fn test_missing_envelope_is_malformed() {
        let body = envelope(serde_json::json!({"finance": {}}));
        assert!(matches!(
            extract_price("AAPL", body).unwrap_err(),
            ProviderError::MalformedResponse(_)
        ));
    }
}
