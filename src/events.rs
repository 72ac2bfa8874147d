//! Ratewatch event bus — typed events from every component.
//!
//! The EventBus is a `tokio::sync::broadcast` channel that carries
//! [`RatewatchEvent`] values. Consumers (log sinks, tests, future dashboards)
//! subscribe independently. When no subscribers exist, events are silently
//! dropped (zero overhead).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Every event Ratewatch emits. Serialized to JSON for external consumers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RatewatchEvent {
    // ── Scheduler Events ──────────────────
    /// A scheduled scrape run has started.
    RunStarted { tick: u64 },
    /// A tick fired while the previous run was still in flight; the tick
    /// was dropped, not queued.
    RunSkipped { tick: u64 },
    /// A scrape run finished (including runs where every site failed).
    RunCompleted {
        tick: u64,
        sites_ok: usize,
        sites_failed: usize,
        written: usize,
        skipped: usize,
        dropped: usize,
        elapsed_ms: u64,
    },

    // ── Per-Site Events ───────────────────
    /// The accessibility probe rejected a site; its run ended without error.
    SiteInaccessible {
        exchange_id: i64,
        url: String,
        status: Option<u16>,
    },
    /// One exchange's page was scraped and its observations persisted.
    SiteScraped {
        exchange_id: i64,
        host: String,
        quotes: usize,
        written: usize,
        skipped: usize,
        dropped: usize,
    },
    /// One exchange's run failed; siblings are unaffected.
    SiteFailed {
        exchange_id: i64,
        url: String,
        error: String,
    },

    // ── Observation Events ────────────────
    /// A new rate row was appended.
    RateWritten {
        exchange_id: i64,
        currency: String,
        side: String,
        rate: f64,
    },
    /// An observation was dropped (unknown label or unparseable value).
    ObservationDropped { exchange_id: i64, label: String },

    // ── System Events ─────────────────────
    /// The Ratewatch runtime started.
    RuntimeStarted { version: String, cadence_secs: u64 },
}

/// The central event bus for Ratewatch.
///
/// All components emit events through this bus. Consumers subscribe
/// to receive a stream of all events.
pub struct EventBus {
    sender: broadcast::Sender<RatewatchEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers. Silently ignores if no subscribers.
    pub fn emit(&self, event: RatewatchEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<RatewatchEvent> {
        self.sender.subscribe()
    }
}
