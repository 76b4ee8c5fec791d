//! Entity kinds and their table descriptors
//!
//! The three record types share one generic CRUD + enrich path. Everything
//! kind-specific (table name, id column, column list, list order, natural key)
//! lives in a static [`EntityDescriptor`] selected by [`EntityKind`].

pub mod input;
pub mod model;

pub use input::{FieldInput, Fields, Value};
pub use model::{Movie, NaturalKey, Record, Ticker, WeatherObservation};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Movie,
    Ticker,
    Weather,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Movie, EntityKind::Ticker, EntityKind::Weather];

    /// URL path segment ("movies", "tickers", "weather")
    pub fn slug(&self) -> &'static str {
        match self {
            EntityKind::Movie => "movies",
            EntityKind::Ticker => "tickers",
            EntityKind::Weather => "weather",
        }
    }

    /// Parse a URL slug or CLI argument; singular forms are accepted too
    pub fn from_slug(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movies" | "movie" => Some(EntityKind::Movie),
            "tickers" | "ticker" => Some(EntityKind::Ticker),
            "weather" => Some(EntityKind::Weather),
            _ => None,
        }
    }

    /// Page heading
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Movie => "Movies",
            EntityKind::Ticker => "Stock Tickers",
            EntityKind::Weather => "Weather",
        }
    }

    /// Label of the per-row enrichment button
    pub fn enrich_label(&self) -> &'static str {
        match self {
            EntityKind::Movie => "Fetch Data",
            EntityKind::Ticker => "Update Price",
            EntityKind::Weather => "Update Weather",
        }
    }

    /// Message shown when a row id does not exist
    pub fn not_found_message(&self) -> &'static str {
        match self {
            EntityKind::Movie => "Movie not found.",
            EntityKind::Ticker => "Ticker not found.",
            EntityKind::Weather => "Weather record not found.",
        }
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        match self {
            EntityKind::Movie => &MOVIE_DESCRIPTOR,
            EntityKind::Ticker => &TICKER_DESCRIPTOR,
            EntityKind::Weather => &WEATHER_DESCRIPTOR,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::from_slug(s)
            .ok_or_else(|| format!("unknown record kind '{}' (expected movies, tickers or weather)", s))
    }
}

/// SQL storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
}

impl ColumnType {
    /// Declared type as reported by `PRAGMA table_info`
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
        }
    }
}

/// One writable column of a record table
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column_type: ColumnType,
    /// NOT NULL in the schema
    pub required: bool,
    /// Overwritten by a successful enrichment
    pub enrichable: bool,
}

const fn column(
    name: &'static str,
    column_type: ColumnType,
    required: bool,
    enrichable: bool,
) -> ColumnSpec {
    ColumnSpec {
        name,
        column_type,
        required,
        enrichable,
    }
}

/// Static description of one record table
#[derive(Debug)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub table: &'static str,
    pub id_column: &'static str,
    /// Writable columns, in display order
    pub columns: &'static [ColumnSpec],
    /// List ordering column
    pub order_by: &'static str,
    /// Column handed to the provider as the lookup key
    pub natural_key: &'static str,
    /// Optional column passed alongside the natural key
    pub hint: Option<&'static str>,
}

impl EntityDescriptor {
    pub fn column(&self, name: &str) -> Option<&'static ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn enrichable_columns(&self) -> impl Iterator<Item = &'static ColumnSpec> {
        self.columns.iter().filter(|c| c.enrichable)
    }

    /// Every column a row read returns, id first, timestamps last
    pub fn select_list(&self) -> String {
        let mut names = Vec::with_capacity(self.columns.len() + 3);
        names.push(self.id_column);
        names.extend(self.columns.iter().map(|c| c.name));
        names.push("created_at");
        names.push("updated_at");
        names.join(", ")
    }

    /// Names of the lookup indexes the schema must carry
    pub fn expected_indexes(&self) -> &'static [&'static str] {
        match self.kind {
            EntityKind::Movie => &["idx_movies_title", "idx_movies_year"],
            EntityKind::Ticker => &["idx_tickers_symbol"],
            EntityKind::Weather => &["idx_weather_city"],
        }
    }
}

static MOVIE_COLUMNS: [ColumnSpec; 7] = [
    column("title", ColumnType::Text, true, false),
    column("director", ColumnType::Text, false, true),
    column("year", ColumnType::Integer, false, true),
    column("plot", ColumnType::Text, false, true),
    column("poster", ColumnType::Text, false, true),
    column("actors", ColumnType::Text, false, true),
    column("genre", ColumnType::Text, false, true),
];

static TICKER_COLUMNS: [ColumnSpec; 3] = [
    column("symbol", ColumnType::Text, true, false),
    column("name", ColumnType::Text, false, false),
    column("price", ColumnType::Real, false, true),
];

static WEATHER_COLUMNS: [ColumnSpec; 3] = [
    column("city", ColumnType::Text, true, false),
    column("state", ColumnType::Text, false, false),
    column("temperature", ColumnType::Real, true, true),
];

pub static MOVIE_DESCRIPTOR: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Movie,
    table: "movies",
    id_column: "movie_id",
    columns: &MOVIE_COLUMNS,
    order_by: "title",
    natural_key: "title",
    hint: None,
};

pub static TICKER_DESCRIPTOR: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Ticker,
    table: "tickers",
    id_column: "ticker_id",
    columns: &TICKER_COLUMNS,
    order_by: "symbol",
    natural_key: "symbol",
    hint: None,
};

pub static WEATHER_DESCRIPTOR: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Weather,
    table: "weather",
    id_column: "weather_id",
    columns: &WEATHER_COLUMNS,
    order_by: "city",
    natural_key: "city",
    hint: Some("state"),
};
