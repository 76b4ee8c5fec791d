//! Form and JSON input parsing
//!
//! Handlers collect raw request fields into a [`FieldInput`] and the kind
//! turns it into validated [`Fields`] ready for the store.

use rk_common::Error;
use std::collections::HashMap;

use super::EntityKind;

/// A column value bound into SQL
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn optional_text(s: Option<String>) -> Self {
        s.map(Value::Text).unwrap_or(Value::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Ordered column/value pairs for an insert or update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(&'static str, Value)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &'static str, value: Value) -> Self {
        self.push(column, value);
        self
    }

    /// Set a column, replacing any earlier value for it
    pub fn push(&mut self, column: &'static str, value: Value) {
        match self.0.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.0.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, Value)> {
        self.0.iter()
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(c, _)| *c)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Raw request fields, keyed by column name
#[derive(Debug, Clone, Default)]
pub struct FieldInput(HashMap<String, String>);

impl FieldInput {
    pub fn from_form(form: HashMap<String, String>) -> Self {
        Self(form)
    }

    /// Flatten a JSON object; `null` counts as absent
    pub fn from_json(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let map = object
            .iter()
            .filter_map(|(k, v)| {
                let s = match v {
                    serde_json::Value::Null => return None,
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((k.clone(), s))
            })
            .collect();
        Self(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Trimmed value, empty string when absent
    pub fn trimmed(&self, key: &str) -> String {
        self.0.get(key).map(|s| s.trim().to_string()).unwrap_or_default()
    }

    /// Trimmed value, `None` when absent or blank
    pub fn non_empty(&self, key: &str) -> Option<String> {
        Some(self.trimmed(key)).filter(|s| !s.is_empty())
    }

    /// Float value, `default` when absent or unparseable
    pub fn float_or(&self, key: &str, default: f64) -> f64 {
        self.non_empty(key)
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|f| f.is_finite())
            .unwrap_or(default)
    }

    /// Integer value, `None` when absent or unparseable
    pub fn integer(&self, key: &str) -> Option<i64> {
        self.non_empty(key).and_then(|s| s.parse::<i64>().ok())
    }
}

/// Temperature stored for a new weather row until it is enriched
pub const PLACEHOLDER_TEMPERATURE: f64 = 75.0;

impl EntityKind {
    /// Validate input for a new row
    ///
    /// Only the fields a user supplies at creation are taken; a movie starts
    /// with its title alone and every enrichable column null.
    pub fn parse_create(&self, input: &FieldInput) -> Result<Fields, Error> {
        match self {
            EntityKind::Movie => {
                let title = self.require(input, "title")?;
                Ok(Fields::new().with("title", Value::Text(title)))
            }
            EntityKind::Ticker => self.parse_ticker(input),
            EntityKind::Weather => {
                let city = self.require(input, "city")?;
                Ok(Fields::new()
                    .with("city", Value::Text(city))
                    .with("state", Value::optional_text(input.non_empty("state")))
                    .with(
                        "temperature",
                        Value::Real(input.float_or("temperature", PLACEHOLDER_TEMPERATURE)),
                    ))
            }
        }
    }

    /// Validate input for a full-row edit
    pub fn parse_update(&self, input: &FieldInput) -> Result<Fields, Error> {
        match self {
            EntityKind::Movie => {
                let title = self.require(input, "title")?;
                let year = input.integer("year").map(Value::Integer).unwrap_or(Value::Null);
                Ok(Fields::new()
                    .with("title", Value::Text(title))
                    .with("director", Value::Text(input.trimmed("director")))
                    .with("year", year)
                    .with("plot", Value::Text(input.trimmed("plot")))
                    .with("poster", Value::Text(input.trimmed("poster")))
                    .with("actors", Value::Text(input.trimmed("actors")))
                    .with("genre", Value::Text(input.trimmed("genre"))))
            }
            EntityKind::Ticker => self.parse_ticker(input),
            EntityKind::Weather => {
                let city = self.require(input, "city")?;
                Ok(Fields::new()
                    .with("city", Value::Text(city))
                    .with("state", Value::optional_text(input.non_empty("state")))
                    .with("temperature", Value::Real(input.float_or("temperature", 0.0))))
            }
        }
    }

    fn parse_ticker(&self, input: &FieldInput) -> Result<Fields, Error> {
        let symbol = input.trimmed("symbol").to_uppercase();
        let name = input.trimmed("name");
        if symbol.is_empty() || name.is_empty() {
            return Err(Error::InvalidInput("Symbol and name are required.".to_string()));
        }
        Ok(Fields::new()
            .with("symbol", Value::Text(symbol))
            .with("name", Value::Text(name))
            .with("price", Value::Real(input.float_or("price", 0.0))))
    }

    fn require(&self, input: &FieldInput, key: &str) -> Result<String, Error> {
        input.non_empty(key).ok_or_else(|| {
            Error::InvalidInput(match self {
                EntityKind::Movie => "Movie title is required.".to_string(),
                EntityKind::Weather => "City name is required.".to_string(),
                EntityKind::Ticker => format!("{} is required.", key),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(pairs: &[(&str, &str)]) -> FieldInput {
        FieldInput::from_form(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_movie_create_takes_title_only() {
        let fields = EntityKind::Movie
            .parse_create(&input(&[("title", "  Inception "), ("director", "Nolan")]))
            .unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("title"), Some(&Value::text("Inception")));
    }

    #[test]
    fn test_movie_title_required() {
        let err = EntityKind::Movie.parse_create(&input(&[("title", "   ")])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m == "Movie title is required."));
    }

    #[test]
    fn test_movie_update_invalid_year_is_null() {
        let fields = EntityKind::Movie
            .parse_update(&input(&[("title", "Heat"), ("year", "nineteen")]))
            .unwrap();
        assert_eq!(fields.get("year"), Some(&Value::Null));
        assert_eq!(fields.get("director"), Some(&Value::text("")));
    }

    #[test]
    fn test_ticker_symbol_uppercased_and_price_defaults() {
        let fields = EntityKind::Ticker
            .parse_create(&input(&[("symbol", " aapl "), ("name", "Apple Inc."), ("price", "oops")]))
            .unwrap();
        assert_eq!(fields.get("symbol"), Some(&Value::text("AAPL")));
        assert_eq!(fields.get("price"), Some(&Value::Real(0.0)));
    }

    #[test]
    fn test_ticker_requires_symbol_and_name() {
        assert!(EntityKind::Ticker.parse_create(&input(&[("symbol", "AAPL")])).is_err());
        assert!(EntityKind::Ticker.parse_update(&input(&[("name", "Apple")])).is_err());
    }

    #[test]
    fn test_weather_temperature_defaults_differ_between_add_and_edit() {
        let created = EntityKind::Weather.parse_create(&input(&[("city", "Macon")])).unwrap();
        assert_eq!(created.get("temperature"), Some(&Value::Real(PLACEHOLDER_TEMPERATURE)));
        assert_eq!(created.get("state"), Some(&Value::Null));

        let edited = EntityKind::Weather.parse_update(&input(&[("city", "Macon")])).unwrap();
        assert_eq!(edited.get("temperature"), Some(&Value::Real(0.0)));
    }

    #[test]
    fn test_json_input_flattens_numbers() {
        let json = serde_json::json!({"symbol": "msft", "name": "Microsoft", "price": 380.5, "extra": null});
        let input = FieldInput::from_json(json.as_object().unwrap());
        let fields = EntityKind::Ticker.parse_create(&input).unwrap();
        assert_eq!(fields.get("price"), Some(&Value::Real(380.5)));
    }
}
