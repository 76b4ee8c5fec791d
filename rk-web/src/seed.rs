//! Sample data
//!
//! Movies are seeded with their title only; use enrichment to fill the rest.
//! Ticker prices and weather temperatures are rough placeholder values.

use rk_common::Result;
use sqlx::SqliteConnection;
use tracing::info;

use crate::db::store;
use crate::records::{EntityKind, Fields, Value};

pub const SAMPLE_MOVIES: [&str; 9] = [
    "The Shawshank Redemption",
    "The Godfather",
    "The Dark Knight",
    "Pulp Fiction",
    "Inception",
    "Star Wars",
    "Dances with Wolves",
    "Star Trek",
    "The Godfather Part II",
];

/// (symbol, name, price)
pub const SAMPLE_TICKERS: [(&str, &str, f64); 11] = [
    ("VTSAX", "Vanguard Total Stock Market Index Fund", 100.0),
    ("AAPL", "Apple Inc.", 175.0),
    ("GOOGL", "Alphabet Inc.", 140.0),
    ("MSFT", "Microsoft Corporation", 380.0),
    ("AMZN", "Amazon.com Inc.", 145.0),
    ("TSLA", "Tesla Inc.", 240.0),
    ("META", "Meta Platforms Inc.", 350.0),
    ("NVDA", "NVIDIA Corporation", 500.0),
    ("JPM", "JPMorgan Chase & Co.", 155.0),
    ("V", "Visa Inc.", 250.0),
    ("WMT", "Walmart Inc.", 160.0),
];

/// (city, state, temperature °F)
pub const SAMPLE_WEATHER: [(&str, &str, f64); 12] = [
    ("Atlanta", "Georgia", 48.0),
    ("Milledgeville", "Georgia", 68.0),
    ("New York", "New York", 55.0),
    ("Los Angeles", "California", 76.0),
    ("Chicago", "Illinois", 46.0),
    ("Miami", "Florida", 82.0),
    ("Seattle", "Washington", 59.0),
    ("Austin", "Texas", 78.0),
    ("Boston", "Massachusetts", 66.0),
    ("Denver", "Colorado", 69.0),
    ("Gray", "Georgia", 45.0),
    ("Macon", "Georgia", 82.0),
];

/// What a seed run did for one kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Inserted { kind: EntityKind, count: usize },
    /// Table already had rows and `force` was not set
    Skipped { kind: EntityKind, existing: i64 },
}

/// Sample rows for one kind
pub fn sample_rows(kind: EntityKind) -> Vec<Fields> {
    match kind {
        EntityKind::Movie => SAMPLE_MOVIES
            .iter()
            .map(|title| Fields::new().with("title", Value::text(*title)))
            .collect(),
        EntityKind::Ticker => SAMPLE_TICKERS
            .iter()
            .map(|(symbol, name, price)| {
                Fields::new()
                    .with("symbol", Value::text(*symbol))
                    .with("name", Value::text(*name))
                    .with("price", Value::Real(*price))
            })
            .collect(),
        EntityKind::Weather => SAMPLE_WEATHER
            .iter()
            .map(|(city, state, temperature)| {
                Fields::new()
                    .with("city", Value::text(*city))
                    .with("state", Value::text(*state))
                    .with("temperature", Value::Real(*temperature))
            })
            .collect(),
    }
}

/// Insert the sample rows for `kind`
///
/// Refuses when the table already has rows unless `force` is set; forced
/// runs append, they never delete.
pub async fn seed(conn: &mut SqliteConnection, kind: EntityKind, force: bool) -> Result<SeedOutcome> {
    let existing = store::count(conn, kind).await?;
    if existing > 0 && !force {
        info!(kind = %kind, existing, "Table not empty, skipping sample data");
        return Ok(SeedOutcome::Skipped { kind, existing });
    }

    let rows = sample_rows(kind);
    for fields in &rows {
        store::insert(conn, kind, fields).await?;
    }

    info!(kind = %kind, count = rows.len(), "Inserted sample data");
    Ok(SeedOutcome::Inserted {
        kind,
        count: rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rk_common::db::init_memory_database;

    #[tokio::test]
    async fn test_seed_then_refuse_then_force() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let outcome = seed(&mut conn, EntityKind::Ticker, false).await.unwrap();
        assert_eq!(
            outcome,
            SeedOutcome::Inserted {
                kind: EntityKind::Ticker,
                count: SAMPLE_TICKERS.len()
            }
        );

        let outcome = seed(&mut conn, EntityKind::Ticker, false).await.unwrap();
        assert_eq!(
            outcome,
            SeedOutcome::Skipped {
                kind: EntityKind::Ticker,
                existing: SAMPLE_TICKERS.len() as i64
            }
        );

        seed(&mut conn, EntityKind::Ticker, true).await.unwrap();
        let count = store::count(&mut conn, EntityKind::Ticker).await.unwrap();
        assert_eq!(count, 2 * SAMPLE_TICKERS.len() as i64);
    }

    #[tokio::test]
    async fn test_seeded_movies_have_no_details() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        seed(&mut conn, EntityKind::Movie, false).await.unwrap();
        let movies = store::list(&mut conn, EntityKind::Movie, None).await.unwrap();
        assert_eq!(movies.len(), SAMPLE_MOVIES.len());
        for movie in movies {
            match movie {
                crate::records::Record::Movie(m) => assert!(m.director.is_none()),
                other => panic!("unexpected {:?}", other),
            }
        }
    }
}
