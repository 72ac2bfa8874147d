//! Scrape orchestrator: fans one run out across all registered exchanges.
//!
//! Each exchange scrapes in its own task; one site's failure is logged and
//! isolated, never propagated to siblings or to the scheduler. Within one
//! site: accessibility probe, navigation with bounded retries, hostname
//! adapter dispatch, label normalization, then concurrent buy/sell writes.

use crate::adapters::{self, RateQuote, SiteAdapter};
use crate::config::ScrapeConfig;
use crate::currency;
use crate::error::ScrapeError;
use crate::events::{EventBus, RatewatchEvent};
use crate::probe::SiteProber;
use crate::renderer::Renderer;
use crate::store::writer::{parse_rate, RateWriter};
use crate::store::{Exchange, RateStore, Side, WriteOutcome};
use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::join_all;
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Counters for one exchange's run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SiteStats {
    pub quotes: usize,
    pub written: usize,
    pub skipped: usize,
    pub dropped: usize,
}

/// Aggregate outcome of one full run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub sites_ok: usize,
    pub sites_failed: usize,
    pub written: usize,
    pub skipped: usize,
    pub dropped: usize,
}

/// Orchestrates scraping across all registered exchanges.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn RateStore>,
    prober: Arc<dyn SiteProber>,
    renderer: Arc<dyn Renderer>,
    events: Arc<EventBus>,
    writer: RateWriter,
    config: ScrapeConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn RateStore>,
        prober: Arc<dyn SiteProber>,
        renderer: Arc<dyn Renderer>,
        events: Arc<EventBus>,
        config: ScrapeConfig,
    ) -> Self {
        let writer = RateWriter::new(Arc::clone(&store), config.freshness);
        Self {
            store,
            prober,
            renderer,
            events,
            writer,
            config,
        }
    }

    /// Scrape every registered exchange, waiting for all tasks to settle.
    ///
    /// Per-site errors are collected and logged here, never re-thrown;
    /// a failure only surfaces from this function when the exchange list
    /// itself cannot be loaded.
    pub async fn run_all(&self) -> Result<RunSummary> {
        let exchanges = self
            .store
            .list_exchanges()
            .await
            .context("failed to load exchange list")?;

        info!(exchanges = exchanges.len(), "starting scrape run");

        let handles: Vec<_> = exchanges
            .into_iter()
            .map(|exchange| {
                let this = self.clone();
                tokio::spawn(async move {
                    let outcome = this.run_one(&exchange).await;
                    (exchange, outcome)
                })
            })
            .collect();

        let mut summary = RunSummary::default();
        for joined in join_all(handles).await {
            match joined {
                Ok((_, Ok(stats))) => {
                    summary.sites_ok += 1;
                    summary.written += stats.written;
                    summary.skipped += stats.skipped;
                    summary.dropped += stats.dropped;
                }
                Ok((exchange, Err(e))) => {
                    summary.sites_failed += 1;
                    error!(
                        exchange_id = exchange.id,
                        exchange = %exchange.name,
                        "scrape failed: {e}"
                    );
                    self.events.emit(RatewatchEvent::SiteFailed {
                        exchange_id: exchange.id,
                        url: exchange.exchange_site.clone(),
                        error: e.to_string(),
                    });
                }
                Err(join_err) => {
                    summary.sites_failed += 1;
                    error!("scrape task panicked: {join_err}");
                }
            }
        }
        Ok(summary)
    }

    /// Scrape a single exchange's rate page.
    ///
    /// An inaccessible site is an expected outcome and returns `Ok` with
    /// empty stats; navigation exhaustion and unsupported hostnames fail
    /// this site only.
    pub async fn run_one(&self, exchange: &Exchange) -> Result<SiteStats, ScrapeError> {
        // 1. Accessibility pre-check against the main site.
        match self
            .prober
            .probe(&exchange.website, self.config.probe_timeout)
            .await
        {
            Ok(status) if (200..300).contains(&status) => {}
            Ok(status) => {
                info!(
                    exchange_id = exchange.id,
                    status, "site not accessible; skipping"
                );
                self.events.emit(RatewatchEvent::SiteInaccessible {
                    exchange_id: exchange.id,
                    url: exchange.website.clone(),
                    status: Some(status),
                });
                return Ok(SiteStats::default());
            }
            Err(e) => {
                info!(exchange_id = exchange.id, "site probe failed: {e:#}");
                self.events.emit(RatewatchEvent::SiteInaccessible {
                    exchange_id: exchange.id,
                    url: exchange.website.clone(),
                    status: None,
                });
                return Ok(SiteStats::default());
            }
        }

        // 2. Navigate the rate page with bounded retries.
        let mut ctx = self
            .renderer
            .new_context()
            .await
            .map_err(ScrapeError::Browser)?;

        let timeout_ms = self.config.nav_timeout.as_millis() as u64;
        let mut last_error = String::new();
        let mut navigated = false;
        for attempt in 1..=self.config.nav_retries {
            match ctx.navigate(&exchange.exchange_site, timeout_ms).await {
                Ok(nav) => {
                    debug!(
                        exchange_id = exchange.id,
                        attempt,
                        load_time_ms = nav.load_time_ms,
                        "page loaded"
                    );
                    navigated = true;
                    break;
                }
                Err(e) => {
                    warn!(
                        exchange_id = exchange.id,
                        attempt,
                        retries = self.config.nav_retries,
                        "navigation attempt failed: {e:#}"
                    );
                    last_error = format!("{e:#}");
                    if attempt < self.config.nav_retries {
                        tokio::time::sleep(self.config.retry_delay()).await;
                    }
                }
            }
        }
        if !navigated {
            let _ = ctx.close().await;
            return Err(ScrapeError::Navigation {
                url: exchange.exchange_site.clone(),
                attempts: self.config.nav_retries,
                last_error,
            });
        }

        // 3. Adapter dispatch on the rendered page's hostname.
        let final_url = ctx
            .url()
            .await
            .unwrap_or_else(|_| exchange.exchange_site.clone());
        let host = adapters::adapter_key(&final_url);
        let Some(adapter) = adapters::adapter_for_host(&host) else {
            let _ = ctx.close().await;
            return Err(ScrapeError::UnsupportedSite { host });
        };

        let html = ctx.html().await.map_err(ScrapeError::Browser)?;
        let _ = ctx.close().await;

        let quotes = extract_quotes(&html, adapter);
        debug!(
            exchange_id = exchange.id,
            host = %host,
            quotes = quotes.len(),
            "extracted quotes"
        );

        // 4. Normalize and fan out writes, both sides of each currency
        // concurrently.
        let now = Utc::now();
        let mut stats = SiteStats {
            quotes: quotes.len(),
            ..SiteStats::default()
        };

        for quote in &quotes {
            let Some(code) = currency::normalize(&quote.label) else {
                debug!(
                    exchange_id = exchange.id,
                    label = %quote.label,
                    "dropping quote with unresolved currency label"
                );
                stats.dropped += 1;
                self.events.emit(RatewatchEvent::ObservationDropped {
                    exchange_id: exchange.id,
                    label: quote.label.clone(),
                });
                continue;
            };

            let buy = self.write_side(exchange.id, code, quote.buy.as_deref(), Side::Buy, now);
            let sell = self.write_side(exchange.id, code, quote.sell.as_deref(), Side::Sell, now);
            let (buy_outcome, sell_outcome) = tokio::join!(buy, sell);

            for outcome in [buy_outcome, sell_outcome].into_iter().flatten() {
                match outcome {
                    WriteOutcome::Written => stats.written += 1,
                    WriteOutcome::Skipped => stats.skipped += 1,
                    WriteOutcome::Dropped => {
                        stats.dropped += 1;
                        self.events.emit(RatewatchEvent::ObservationDropped {
                            exchange_id: exchange.id,
                            label: quote.label.clone(),
                        });
                    }
                }
            }
        }

        self.events.emit(RatewatchEvent::SiteScraped {
            exchange_id: exchange.id,
            host,
            quotes: stats.quotes,
            written: stats.written,
            skipped: stats.skipped,
            dropped: stats.dropped,
        });

        Ok(stats)
    }

    /// Write one side of a quote, if present. A storage failure is reported
    /// here and swallowed: the other side's write must still complete.
    async fn write_side(
        &self,
        exchange_id: i64,
        currency: &'static str,
        raw: Option<&str>,
        side: Side,
        now: chrono::DateTime<Utc>,
    ) -> Option<WriteOutcome> {
        let raw = raw?;
        match self
            .writer
            .write_if_new(exchange_id, currency, raw, side, now)
            .await
        {
            Ok(outcome) => {
                if outcome == WriteOutcome::Written {
                    if let Some(rate) = parse_rate(raw) {
                        self.events.emit(RatewatchEvent::RateWritten {
                            exchange_id,
                            currency: currency.to_string(),
                            side: side.as_str().to_string(),
                            rate,
                        });
                    }
                }
                Some(outcome)
            }
            Err(e) => {
                error!(
                    exchange_id,
                    currency,
                    side = side.as_str(),
                    "rate write failed: {e:#}"
                );
                None
            }
        }
    }
}

/// Parse the rendered HTML and run the adapter. Kept out of the async path:
/// `scraper::Html` is not `Send`, so it must not live across an await.
fn extract_quotes(html: &str, adapter: SiteAdapter) -> Vec<RateQuote> {
    let doc = Html::parse_document(html);
    adapter.extract(&doc)
}
