//! Persistence layer: exchange registry and append-only rate history.
//!
//! The core consumes storage only through the [`RateStore`] trait. The
//! production backend is SQLite ([`sqlite::SqliteStore`]); tests substitute
//! in-memory implementations. Exchange identity is owned by an external CRUD
//! layer — this core reads exchanges and appends rates, nothing else.

pub mod sqlite;
pub mod writer;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One currency-exchange business and the URL of its published-rates page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub id: i64,
    pub name: String,
    pub location: String,
    /// Main site, used for the accessibility probe.
    pub website: String,
    /// The page actually scraped for rates.
    pub exchange_site: String,
}

/// Buy or sell classification of a rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(Side::Buy),
            "SELL" => Some(Side::Sell),
            _ => None,
        }
    }
}

/// One persisted, timestamped rate observation. Append-only: rows are never
/// updated or deleted by this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rate {
    pub id: i64,
    pub exchange_id: i64,
    /// Canonical currency code (see [`crate::currency`]).
    pub currency: String,
    pub rate: f64,
    pub side: Side,
    pub date: DateTime<Utc>,
}

/// Result of a dedup-aware write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new row was appended.
    Written,
    /// An identical fresh row already exists; nothing was stored.
    Skipped,
    /// The raw value did not parse; the observation was discarded.
    Dropped,
}

/// Storage interface consumed by the scrape pipeline.
#[async_trait]
pub trait RateStore: Send + Sync {
    async fn list_exchanges(&self) -> Result<Vec<Exchange>>;

    async fn get_exchange(&self, id: i64) -> Result<Option<Exchange>>;

    /// Register an exchange. Owned by the operator surface, not the scrape
    /// pipeline; the pipeline never calls this.
    async fn insert_exchange(
        &self,
        name: &str,
        location: &str,
        website: &str,
        exchange_site: &str,
    ) -> Result<Exchange>;

    /// Most recent rate for (exchange, currency, side), if any.
    async fn find_latest_rate(
        &self,
        exchange_id: i64,
        currency: &str,
        side: Side,
    ) -> Result<Option<Rate>>;

    /// Append a new rate row. Never mutates existing rows.
    async fn insert_rate(
        &self,
        exchange_id: i64,
        currency: &str,
        rate: f64,
        side: Side,
        date: DateTime<Utc>,
    ) -> Result<Rate>;

    /// Read-only view over stored rates, newest first.
    async fn list_rates(
        &self,
        exchange_id: i64,
        currency: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Rate>>;
}
