//! Geocode + forecast adapter
//!
//! Three sequential requests, each bounded by the client timeout:
//! 1. Geocode `"<city>, <state>, USA"` through a Nominatim-compatible search
//!    (`format=json&limit=1`) to latitude/longitude
//! 2. `GET <forecast>/points/<lat>,<lon>` to find the grid forecast URL
//! 3. `GET <forecast URL>` and read `properties.periods[0].temperature`
//!
//! A 404 from steps 2 or 3 means the forecast service does not cover the
//! location and is reported as `UnsupportedLocation`, not `NotFound`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{
    classify_request_error, log_outcome, parse_json, status_error, Enrichment, ProviderAdapter,
    ProviderError,
};
use crate::records::{EntityKind, NaturalKey};

/// One Nominatim search hit; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct GeocodeCandidate {
    lat: Option<serde_json::Value>,
    lon: Option<serde_json::Value>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: Option<PointsProperties>,
}

#[derive(Debug, Deserialize)]
struct PointsProperties {
    forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: Option<ForecastProperties>,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    periods: Option<Vec<ForecastPeriod>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastPeriod {
    temperature: Option<f64>,
    temperature_unit: Option<String>,
}

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Nominatim + weather.gov client
pub struct ForecastClient {
    http_client: Client,
    geocode_url: String,
    forecast_url: String,
}

impl ForecastClient {
    pub fn new(http_client: Client, geocode_url: String, forecast_url: String) -> Self {
        Self {
            http_client,
            geocode_url,
            forecast_url,
        }
    }

    /// Step 1: city (+ state) to coordinates
    pub async fn geocode(&self, city: &str, state: Option<&str>) -> Result<Coordinates, ProviderError> {
        let query = location_query(city, state);
        debug!(query = %query, "Geocoding location");

        let response = self
            .http_client
            .get(&self.geocode_url)
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| classify_request_error(e, "geocode request"))?;

        if !response.status().is_success() {
            return Err(status_error(response, "geocoder").await);
        }

        let candidates: Vec<GeocodeCandidate> = parse_json(response, "geocode response").await?;
        let candidate = candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(format!("no coordinates for '{}'", query)))?;

        let coords = Coordinates {
            lat: coordinate(candidate.lat.as_ref(), "lat", 90.0)?,
            lon: coordinate(candidate.lon.as_ref(), "lon", 180.0)?,
        };
        debug!(
            lat = coords.lat,
            lon = coords.lon,
            place = candidate.display_name.as_deref().unwrap_or(""),
            "Geocoded location"
        );
        Ok(coords)
    }

    /// Step 2: coordinates to the gridpoint forecast URL
    async fn forecast_url_for(&self, coords: Coordinates) -> Result<String, ProviderError> {
        let url = format!(
            "{}/points/{:.4},{:.4}",
            self.forecast_url.trim_end_matches('/'),
            coords.lat,
            coords.lon
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| classify_request_error(e, "points request"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::UnsupportedLocation(format!(
                "no forecast grid at {:.4},{:.4}",
                coords.lat, coords.lon
            )));
        }
        if !response.status().is_success() {
            return Err(status_error(response, "points endpoint").await);
        }

        let points: PointsResponse = parse_json(response, "points response").await?;
        points
            .properties
            .and_then(|p| p.forecast)
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::MalformedResponse("points response lacks properties.forecast".to_string())
            })
    }

    /// Step 3: temperature of the first forecast period, in °F
    async fn first_period_temperature(&self, forecast_url: &str) -> Result<f64, ProviderError> {
        let response = self
            .http_client
            .get(forecast_url)
            .send()
            .await
            .map_err(|e| classify_request_error(e, "forecast request"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::UnsupportedLocation(format!(
                "forecast unavailable at {}",
                forecast_url
            )));
        }
        if !response.status().is_success() {
            return Err(status_error(response, "forecast endpoint").await);
        }

        let forecast: ForecastResponse = parse_json(response, "forecast response").await?;
        let period = forecast
            .properties
            .and_then(|p| p.periods)
            .and_then(|periods| periods.into_iter().next())
            .ok_or_else(|| {
                ProviderError::MalformedResponse("forecast has no periods".to_string())
            })?;

        let temperature = period.temperature.ok_or_else(|| {
            ProviderError::MalformedResponse("first period lacks temperature".to_string())
        })?;

        Ok(match period.temperature_unit.as_deref() {
            Some("C") => temperature * 9.0 / 5.0 + 32.0,
            _ => temperature,
        })
    }

    async fn lookup(&self, city: &str, state: Option<&str>) -> Result<Enrichment, ProviderError> {
        let coords = self.geocode(city, state).await?;
        let forecast_url = self.forecast_url_for(coords).await?;
        debug!(forecast_url = %forecast_url, "Resolved forecast URL");
        let temperature = self.first_period_temperature(&forecast_url).await?;
        Ok(Enrichment::Forecast { temperature })
    }
}

/// Free-text search string sent to the geocoder
pub fn location_query(city: &str, state: Option<&str>) -> String {
    match state.map(str::trim).filter(|s| !s.is_empty()) {
        Some(state) => format!("{}, {}, USA", city.trim(), state),
        None => format!("{}, USA", city.trim()),
    }
}

fn coordinate(
    value: Option<&serde_json::Value>,
    name: &str,
    limit: f64,
) -> Result<f64, ProviderError> {
    let parsed = match value {
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite() && v.abs() <= limit)
        .ok_or_else(|| {
            ProviderError::MalformedResponse(format!("unparseable {} in geocode result: {:?}", name, value))
        })
}

#[async_trait]
impl ProviderAdapter for ForecastClient {
    fn name(&self) -> &'static str {
        "forecast"
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Weather
    }

    async fn fetch(&self, key: &NaturalKey) -> Result<Enrichment, ProviderError> {
        let outcome = self.lookup(&key.key, key.hint.as_deref()).await;
        log_outcome(self.name(), key, &outcome);
        outcome
    }
}
