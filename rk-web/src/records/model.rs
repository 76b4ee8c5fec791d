//! Typed rows for the three record tables

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

use super::EntityKind;

/// A stored movie
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Movie {
    pub movie_id: i64,
    pub title: String,
    pub director: Option<String>,
    pub year: Option<i64>,
    pub plot: Option<String>,
    pub poster: Option<String>,
    pub actors: Option<String>,
    pub genre: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A stored stock ticker
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Ticker {
    pub ticker_id: i64,
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A stored weather observation (temperature in °F)
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WeatherObservation {
    pub weather_id: i64,
    pub city: String,
    pub state: Option<String>,
    pub temperature: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Lookup key handed to a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NaturalKey {
    pub key: String,
    /// Disambiguator, e.g. the state for a weather city
    pub hint: Option<String>,
}

impl NaturalKey {
    pub fn new(key: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            key: key.into(),
            hint: hint.filter(|h| !h.trim().is_empty()),
        }
    }
}

/// A row of any kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Movie(Movie),
    Ticker(Ticker),
    Weather(WeatherObservation),
}

impl Record {
    /// Decode a row selected with the kind's `select_list()`
    pub fn from_row(kind: EntityKind, row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(match kind {
            EntityKind::Movie => Record::Movie(Movie::from_row(row)?),
            EntityKind::Ticker => Record::Ticker(Ticker::from_row(row)?),
            EntityKind::Weather => Record::Weather(WeatherObservation::from_row(row)?),
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Movie(_) => EntityKind::Movie,
            Record::Ticker(_) => EntityKind::Ticker,
            Record::Weather(_) => EntityKind::Weather,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Record::Movie(m) => m.movie_id,
            Record::Ticker(t) => t.ticker_id,
            Record::Weather(w) => w.weather_id,
        }
    }

    pub fn natural_key(&self) -> NaturalKey {
        match self {
            Record::Movie(m) => NaturalKey::new(m.title.clone(), None),
            Record::Ticker(t) => NaturalKey::new(t.symbol.clone(), None),
            Record::Weather(w) => NaturalKey::new(w.city.clone(), w.state.clone()),
        }
    }

    /// Short name used in headings and messages
    pub fn display_name(&self) -> String {
        match self {
            Record::Movie(m) => m.title.clone(),
            Record::Ticker(t) => t.symbol.clone(),
            Record::Weather(w) => match &w.state {
                Some(state) if !state.is_empty() => format!("{}, {}", w.city, state),
                _ => w.city.clone(),
            },
        }
    }

    pub fn created_at(&self) -> NaiveDateTime {
        match self {
            Record::Movie(m) => m.created_at,
            Record::Ticker(t) => t.created_at,
            Record::Weather(w) => w.created_at,
        }
    }

    pub fn updated_at(&self) -> NaiveDateTime {
        match self {
            Record::Movie(m) => m.updated_at,
            Record::Ticker(t) => t.updated_at,
            Record::Weather(w) => w.updated_at,
        }
    }

    /// Column name and display text for every writable column
    ///
    /// Prices show two decimals and temperatures one.
    pub fn display_fields(&self) -> Vec<(&'static str, String)> {
        self.fields(
            |price| format!("{:.2}", price),
            |temperature| format!("{:.1}", temperature),
        )
    }

    /// Column name and stored value for every writable column
    ///
    /// Numbers keep full precision so an edit form posted back unchanged
    /// stores the same values.
    pub fn form_values(&self) -> Vec<(&'static str, String)> {
        self.fields(|price| price.to_string(), |temperature| temperature.to_string())
    }

    fn fields(
        &self,
        price: impl Fn(f64) -> String,
        temperature: impl Fn(f64) -> String,
    ) -> Vec<(&'static str, String)> {
        fn text(v: &Option<String>) -> String {
            v.clone().unwrap_or_default()
        }

        match self {
            Record::Movie(m) => vec![
                ("title", m.title.clone()),
                ("director", text(&m.director)),
                ("year", m.year.map(|y| y.to_string()).unwrap_or_default()),
                ("plot", text(&m.plot)),
                ("poster", text(&m.poster)),
                ("actors", text(&m.actors)),
                ("genre", text(&m.genre)),
            ],
            Record::Ticker(t) => vec![
                ("symbol", t.symbol.clone()),
                ("name", text(&t.name)),
                ("price", t.price.map(price).unwrap_or_default()),
            ],
            Record::Weather(w) => vec![
                ("city", w.city.clone()),
                ("state", text(&w.state)),
                ("temperature", temperature(w.temperature)),
            ],
        }
    }

    pub fn added_message(&self) -> String {
        match self {
            Record::Movie(m) => format!(
                "Movie '{}' added successfully! Click 'Fetch Data' to get movie details from OMDB.",
                m.title
            ),
            Record::Ticker(t) => format!("Ticker {} added successfully!", t.symbol),
            Record::Weather(w) => format!(
                "Weather for {} added successfully! Click 'Update Weather' to fetch live data.",
                w.city
            ),
        }
    }

    pub fn updated_message(&self) -> String {
        match self {
            Record::Movie(m) => format!("Movie '{}' updated successfully!", m.title),
            Record::Ticker(t) => format!("Ticker {} updated successfully!", t.symbol),
            Record::Weather(w) => format!("Weather for {} updated successfully!", w.city),
        }
    }

    pub fn deleted_message(&self) -> String {
        match self {
            Record::Movie(m) => format!("Movie '{}' deleted successfully!", m.title),
            Record::Ticker(_) => "Ticker deleted successfully!".to_string(),
            Record::Weather(_) => "Weather record deleted successfully!".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(price: Option<f64>) -> Record {
        Record::Ticker(Ticker {
            ticker_id: 1,
            symbol: "AAPL".to_string(),
            name: Some("Apple".to_string()),
            price,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        })
    }

    fn value_of(fields: &[(&'static str, String)], name: &str) -> String {
        fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
            .unwrap()
    }

    #[test]
    fn test_form_values_keep_full_precision() {
        let record = ticker(Some(191.456));
        assert_eq!(value_of(&record.display_fields(), "price"), "191.46");
        assert_eq!(value_of(&record.form_values(), "price"), "191.456");

        let weather = Record::Weather(WeatherObservation {
            weather_id: 1,
            city: "Atlanta".to_string(),
            state: None,
            temperature: 48.26,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        });
        assert_eq!(value_of(&weather.display_fields(), "temperature"), "48.3");
        assert_eq!(value_of(&weather.form_values(), "temperature"), "48.26");
    }

    #[test]
    fn test_form_values_leave_missing_price_blank() {
        assert_eq!(value_of(&ticker(None).form_values(), "price"), "");
    }
}
