//! Dedup-aware rate persistence.
//!
//! Largely-static rates would otherwise grow the history by one row per
//! scrape per currency per side. The write policy records a row only when it
//! carries information: the first observation for a key, a changed value, or
//! a refresh after the freshness window expires.

use super::{RateStore, Side, WriteOutcome};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;

/// Parse a scraped rate value.
///
/// Source pages are Turkish-formatted, so a decimal comma ("30,10") and
/// thousands separators ("1.234,56") both appear. Anything non-finite or
/// negative is rejected.
pub fn parse_rate(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    let value: f64 = normalized.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Applies the dedup policy in front of a [`RateStore`].
#[derive(Clone)]
pub struct RateWriter {
    store: Arc<dyn RateStore>,
    freshness: Duration,
}

impl RateWriter {
    pub fn new(store: Arc<dyn RateStore>, freshness: std::time::Duration) -> Self {
        Self {
            store,
            freshness: Duration::from_std(freshness).unwrap_or_else(|_| Duration::hours(1)),
        }
    }

    /// Persist one observation unless it is redundant.
    ///
    /// Writes iff no prior row exists for (exchange, currency, side), the
    /// value changed, or the latest row has aged past the freshness window.
    /// Unparseable values are dropped without error — malformed source data
    /// is routine, not exceptional.
    pub async fn write_if_new(
        &self,
        exchange_id: i64,
        currency: &str,
        raw: &str,
        side: Side,
        now: DateTime<Utc>,
    ) -> Result<WriteOutcome> {
        let Some(value) = parse_rate(raw) else {
            debug!(exchange_id, currency, raw, "dropping unparseable rate value");
            return Ok(WriteOutcome::Dropped);
        };

        let latest = self.store.find_latest_rate(exchange_id, currency, side).await?;

        let should_write = match &latest {
            None => true,
            Some(prev) => prev.rate != value || prev.date + self.freshness <= now,
        };

        if !should_write {
            return Ok(WriteOutcome::Skipped);
        }

        self.store
            .insert_rate(exchange_id, currency, value, side, now)
            .await?;
        Ok(WriteOutcome::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::SqliteStore;
    use std::time::Duration as StdDuration;

    fn writer_over(store: Arc<SqliteStore>) -> RateWriter {
        RateWriter::new(store, StdDuration::from_secs(3600))
    }

    async fn seeded_store() -> (Arc<SqliteStore>, i64) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let ex = store
            .insert_exchange("X", "Nicosia", "https://x.example", "https://x.example/rates")
            .await
            .unwrap();
        (store, ex.id)
    }

    #[test]
    fn test_parse_rate_formats() {
        assert_eq!(parse_rate("30.10"), Some(30.10));
        assert_eq!(parse_rate(" 30,10 "), Some(30.10));
        assert_eq!(parse_rate("1.234,56"), Some(1234.56));
        assert_eq!(parse_rate("0"), Some(0.0));
        assert_eq!(parse_rate("-1.5"), None);
        assert_eq!(parse_rate("n/a"), None);
        assert_eq!(parse_rate(""), None);
        assert_eq!(parse_rate("NaN"), None);
        assert_eq!(parse_rate("inf"), None);
    }

    #[tokio::test]
    async fn test_write_if_new_is_idempotent() {
        let (store, ex) = seeded_store().await;
        let writer = writer_over(Arc::clone(&store));
        let now = Utc::now();

        let first = writer.write_if_new(ex, "USD", "30.10", Side::Buy, now).await.unwrap();
        assert_eq!(first, WriteOutcome::Written);

        let second = writer.write_if_new(ex, "USD", "30.10", Side::Buy, now).await.unwrap();
        assert_eq!(second, WriteOutcome::Skipped);

        let rows = store.list_rates(ex, Some("USD"), 10).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_changed_value_writes_immediately() {
        let (store, ex) = seeded_store().await;
        let writer = writer_over(Arc::clone(&store));
        let now = Utc::now();

        writer.write_if_new(ex, "USD", "30.10", Side::Buy, now).await.unwrap();
        let outcome = writer
            .write_if_new(ex, "USD", "30.15", Side::Buy, now + Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Written);

        let rows = store.list_rates(ex, Some("USD"), 10).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_freshness_window_boundary() {
        let (store, ex) = seeded_store().await;
        let writer = writer_over(Arc::clone(&store));
        let t0 = Utc::now();

        writer.write_if_new(ex, "USD", "30.10", Side::Buy, t0).await.unwrap();

        // Just inside the window, unchanged value: skipped.
        let before = writer
            .write_if_new(ex, "USD", "30.10", Side::Buy, t0 + Duration::seconds(3599))
            .await
            .unwrap();
        assert_eq!(before, WriteOutcome::Skipped);

        // Exactly at window expiry: refreshed.
        let at_expiry = writer
            .write_if_new(ex, "USD", "30.10", Side::Buy, t0 + Duration::seconds(3600))
            .await
            .unwrap();
        assert_eq!(at_expiry, WriteOutcome::Written);
    }

    #[tokio::test]
    async fn test_sides_are_independent_keys() {
        let (store, ex) = seeded_store().await;
        let writer = writer_over(Arc::clone(&store));
        let now = Utc::now();

        assert_eq!(
            writer.write_if_new(ex, "USD", "30.10", Side::Buy, now).await.unwrap(),
            WriteOutcome::Written
        );
        assert_eq!(
            writer.write_if_new(ex, "USD", "30.10", Side::Sell, now).await.unwrap(),
            WriteOutcome::Written
        );
    }

    #[tokio::test]
    async fn test_unparseable_value_is_dropped_without_write() {
        let (store, ex) = seeded_store().await;
        let writer = writer_over(Arc::clone(&store));

        let outcome = writer
            .write_if_new(ex, "USD", "call us", Side::Buy, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Dropped);
        assert!(store.list_rates(ex, None, 10).await.unwrap().is_empty());
    }
}
