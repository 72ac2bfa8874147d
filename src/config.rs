//! Runtime configuration from environment variables.
//!
//! Every knob has a production default matching the deployment the scrapers
//! were written for: a one-minute cadence, generous navigation timeouts
//! (target sites are slow), and an hourly freshness window for the dedup
//! policy.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CADENCE_SECS: u64 = 60;
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_NAV_TIMEOUT_SECS: u64 = 90;
const DEFAULT_NAV_RETRIES: u32 = 4;
const DEFAULT_FRESHNESS_SECS: u64 = 3600;

/// Configuration for the scrape pipeline.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// How often the scheduler fires a run.
    pub cadence: Duration,
    /// Timeout for the HEAD-equivalent accessibility probe.
    pub probe_timeout: Duration,
    /// Timeout for a single page-navigation attempt.
    pub nav_timeout: Duration,
    /// Maximum navigation attempts per site per run.
    pub nav_retries: u32,
    /// Age after which an unchanged rate is re-persisted anyway.
    pub freshness: Duration,
    /// SQLite database location.
    pub db_path: PathBuf,
}

impl ScrapeConfig {
    /// Load configuration from `RATEWATCH_*` environment variables,
    /// falling back to production defaults.
    pub fn from_env() -> Self {
        Self {
            cadence: Duration::from_secs(
                read_env_u64("RATEWATCH_CADENCE_SECS", DEFAULT_CADENCE_SECS).max(1),
            ),
            probe_timeout: Duration::from_secs(
                read_env_u64("RATEWATCH_PROBE_TIMEOUT_SECS", DEFAULT_PROBE_TIMEOUT_SECS).max(1),
            ),
            nav_timeout: Duration::from_secs(
                read_env_u64("RATEWATCH_NAV_TIMEOUT_SECS", DEFAULT_NAV_TIMEOUT_SECS).max(1),
            ),
            nav_retries: read_env_u32("RATEWATCH_NAV_RETRIES", DEFAULT_NAV_RETRIES).max(1),
            freshness: Duration::from_secs(
                read_env_u64("RATEWATCH_FRESHNESS_SECS", DEFAULT_FRESHNESS_SECS).max(1),
            ),
            db_path: std::env::var("RATEWATCH_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_db_path()),
        }
    }

    /// Pause between failed navigation attempts: a fixed fraction of the
    /// attempt timeout.
    pub fn retry_delay(&self) -> Duration {
        self.nav_timeout / 4
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::from_secs(DEFAULT_CADENCE_SECS),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            nav_timeout: Duration::from_secs(DEFAULT_NAV_TIMEOUT_SECS),
            nav_retries: DEFAULT_NAV_RETRIES,
            freshness: Duration::from_secs(DEFAULT_FRESHNESS_SECS),
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".ratewatch")
        .join("ratewatch.db")
}

fn read_env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn read_env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.cadence, Duration::from_secs(60));
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.nav_timeout, Duration::from_secs(90));
        assert_eq!(config.nav_retries, 4);
        assert_eq!(config.freshness, Duration::from_secs(3600));
    }

    #[test]
    fn test_retry_delay_is_quarter_timeout() {
        let config = ScrapeConfig::default();
        assert_eq!(config.retry_delay(), Duration::from_secs(90) / 4);
    }
}
