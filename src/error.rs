//! Error taxonomy for the scraping pipeline.
//!
//! A `ScrapeError` is scoped to exactly one exchange's run. The orchestrator
//! logs it and moves on; it never crosses to sibling sites or fails the
//! scheduler tick. Fatal errors (Chromium cannot be launched at startup)
//! surface as `anyhow::Error` from `scheduler::start` instead.
//!
//! Unparseable values and unresolved currency labels are not errors at all —
//! those observations are dropped and counted.

use thiserror::Error;

/// Failure of a single exchange's scrape run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Every navigation attempt against the rate page failed.
    #[error("navigation to {url} failed after {attempts} attempts: {last_error}")]
    Navigation {
        url: String,
        attempts: u32,
        last_error: String,
    },

    /// The rendered page's hostname has no registered adapter.
    #[error("no adapter registered for host {host:?}")]
    UnsupportedSite { host: String },

    /// A browser context could not be created or queried.
    #[error("browser context error: {0}")]
    Browser(#[source] anyhow::Error),
}
