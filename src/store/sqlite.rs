//! SQLite-backed rate store.
//!
//! The schema is created on open. Dates are stored as RFC 3339 text. The
//! connection sits behind a mutex; trait methods stay async so the writer
//! fan-out and test doubles compose with the rest of the pipeline.

use super::{Exchange, Rate, RateStore, Side};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed implementation of [`RateStore`].
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let db = Connection::open(path)
            .with_context(|| format!("failed to open rate store: {}", path.display()))?;
        Self::init_schema(&db)?;
        Ok(Self { db: Mutex::new(db) })
    }

    /// In-memory store, used by tests.
    pub fn in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("failed to open in-memory store")?;
        Self::init_schema(&db)?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn init_schema(db: &Connection) -> Result<()> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS exchanges (
                id            INTEGER PRIMARY KEY,
                name          TEXT NOT NULL,
                location      TEXT NOT NULL,
                website       TEXT NOT NULL,
                exchange_site TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS rates (
                id          INTEGER PRIMARY KEY,
                exchange_id INTEGER NOT NULL REFERENCES exchanges(id),
                currency    TEXT NOT NULL,
                rate        REAL NOT NULL,
                side        TEXT NOT NULL,
                date        TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_rates_latest
                ON rates (exchange_id, currency, side, date DESC);",
        )
        .context("failed to create schema")
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| anyhow!("rate store mutex poisoned"))
    }
}

fn row_to_rate(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, i64, String, f64, String, String)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn build_rate(raw: (i64, i64, String, f64, String, String)) -> Result<Rate> {
    let (id, exchange_id, currency, rate, side, date) = raw;
    let side = Side::from_str(&side).ok_or_else(|| anyhow!("invalid side in row {id}: {side:?}"))?;
    let date = DateTime::parse_from_rfc3339(&date)
        .with_context(|| format!("invalid date in row {id}: {date:?}"))?
        .with_timezone(&Utc);
    Ok(Rate {
        id,
        exchange_id,
        currency,
        rate,
        side,
        date,
    })
}

#[async_trait]
impl RateStore for SqliteStore {
    async fn list_exchanges(&self) -> Result<Vec<Exchange>> {
        let db = self.conn()?;
        let mut stmt = db
            .prepare("SELECT id, name, location, website, exchange_site FROM exchanges ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Exchange {
                id: row.get(0)?,
                name: row.get(1)?,
                location: row.get(2)?,
                website: row.get(3)?,
                exchange_site: row.get(4)?,
            })
        })?;
        let mut exchanges = Vec::new();
        for row in rows {
            exchanges.push(row?);
        }
        Ok(exchanges)
    }

    async fn get_exchange(&self, id: i64) -> Result<Option<Exchange>> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT id, name, location, website, exchange_site FROM exchanges WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map([id], |row| {
            Ok(Exchange {
                id: row.get(0)?,
                name: row.get(1)?,
                location: row.get(2)?,
                website: row.get(3)?,
                exchange_site: row.get(4)?,
            })
        })?;
        rows.next().transpose().map_err(Into::into)
    }

    async fn insert_exchange(
        &self,
        name: &str,
        location: &str,
        website: &str,
        exchange_site: &str,
    ) -> Result<Exchange> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO exchanges (name, location, website, exchange_site) VALUES (?1, ?2, ?3, ?4)",
            (name, location, website, exchange_site),
        )?;
        Ok(Exchange {
            id: db.last_insert_rowid(),
            name: name.to_string(),
            location: location.to_string(),
            website: website.to_string(),
            exchange_site: exchange_site.to_string(),
        })
    }

    async fn find_latest_rate(
        &self,
        exchange_id: i64,
        currency: &str,
        side: Side,
    ) -> Result<Option<Rate>> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT id, exchange_id, currency, rate, side, date FROM rates
             WHERE exchange_id = ?1 AND currency = ?2 AND side = ?3
             ORDER BY date DESC, id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map((exchange_id, currency, side.as_str()), row_to_rate)?;
        match rows.next().transpose()? {
            Some(raw) => Ok(Some(build_rate(raw)?)),
            None => Ok(None),
        }
    }

    async fn insert_rate(
        &self,
        exchange_id: i64,
        currency: &str,
        rate: f64,
        side: Side,
        date: DateTime<Utc>,
    ) -> Result<Rate> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO rates (exchange_id, currency, rate, side, date) VALUES (?1, ?2, ?3, ?4, ?5)",
            (exchange_id, currency, rate, side.as_str(), date.to_rfc3339()),
        )?;
        Ok(Rate {
            id: db.last_insert_rowid(),
            exchange_id,
            currency: currency.to_string(),
            rate,
            side,
            date,
        })
    }

    async fn list_rates(
        &self,
        exchange_id: i64,
        currency: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Rate>> {
        let db = self.conn()?;
        let mut rates = Vec::new();
        match currency {
            Some(code) => {
                let mut stmt = db.prepare(
                    "SELECT id, exchange_id, currency, rate, side, date FROM rates
                     WHERE exchange_id = ?1 AND currency = ?2
                     ORDER BY date DESC, id DESC LIMIT ?3",
                )?;
                let rows = stmt.query_map((exchange_id, code, limit as i64), row_to_rate)?;
                for row in rows {
                    rates.push(build_rate(row?)?);
                }
            }
            None => {
                let mut stmt = db.prepare(
                    "SELECT id, exchange_id, currency, rate, side, date FROM rates
                     WHERE exchange_id = ?1
                     ORDER BY date DESC, id DESC LIMIT ?2",
                )?;
                let rows = stmt.query_map((exchange_id, limit as i64), row_to_rate)?;
                for row in rows {
                    rates.push(build_rate(row?)?);
                }
            }
        }
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exchange_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        let ex = store
            .insert_exchange("Sun Exchange", "Nicosia", "https://sunexchange.com", "https://sunexchange.com/rates")
            .await
            .unwrap();
        assert_eq!(ex.name, "Sun Exchange");

        let listed = store.list_exchanges().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, ex.id);

        let fetched = store.get_exchange(ex.id).await.unwrap().unwrap();
        assert_eq!(fetched.exchange_site, "https://sunexchange.com/rates");
        assert!(store.get_exchange(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_rate_is_newest_for_key() {
        let store = SqliteStore::in_memory().unwrap();
        let ex = store
            .insert_exchange("X", "Kyrenia", "https://x.example", "https://x.example/r")
            .await
            .unwrap();

        let t0 = Utc::now() - chrono::Duration::hours(2);
        let t1 = Utc::now();
        store.insert_rate(ex.id, "USD", 30.0, Side::Buy, t0).await.unwrap();
        store.insert_rate(ex.id, "USD", 30.5, Side::Buy, t1).await.unwrap();
        store.insert_rate(ex.id, "USD", 31.0, Side::Sell, t1).await.unwrap();

        let latest = store
            .find_latest_rate(ex.id, "USD", Side::Buy)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.rate, 30.5);

        assert!(store
            .find_latest_rate(ex.id, "EUR", Side::Buy)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_rates_filters_and_orders() {
        let store = SqliteStore::in_memory().unwrap();
        let ex = store
            .insert_exchange("X", "Famagusta", "https://x.example", "https://x.example/r")
            .await
            .unwrap();

        let now = Utc::now();
        for (i, code) in ["USD", "EUR", "USD"].iter().enumerate() {
            store
                .insert_rate(ex.id, code, 10.0 + i as f64, Side::Buy, now + chrono::Duration::seconds(i as i64))
                .await
                .unwrap();
        }

        let usd = store.list_rates(ex.id, Some("USD"), 10).await.unwrap();
        assert_eq!(usd.len(), 2);
        assert_eq!(usd[0].rate, 12.0); // newest first

        let all = store.list_rates(ex.id, None, 2).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
