//! Fixed-cadence run scheduler.
//!
//! Owns the Idle/Running latch: a tick that fires while a run is still in
//! flight is dropped and logged, never queued. The shared browser is
//! acquired once at startup (fatal if that fails) and released exactly once
//! at shutdown, regardless of in-flight tasks. A failed run still returns
//! the scheduler to Idle so the next tick can proceed.

use crate::config::ScrapeConfig;
use crate::events::{EventBus, RatewatchEvent};
use crate::orchestrator::Orchestrator;
use crate::probe::{HttpProber, SiteProber};
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use crate::store::RateStore;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Drives the orchestrator on a fixed cadence with an overlap latch.
pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    cadence: Duration,
    events: Arc<EventBus>,
    /// Idle (false) / Running (true). Mutated only at run start and end.
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, cadence: Duration, events: Arc<EventBus>) -> Self {
        Self {
            orchestrator,
            cadence,
            events,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get the shutdown notifier (for external shutdown signaling).
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Tick until shutdown is signaled. The first tick fires immediately.
    pub async fn run(&self) {
        let mut interval = tokio::time::interval(self.cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tick: u64 = 0;

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("scheduler shutting down");
                    break;
                }
                _ = interval.tick() => {
                    tick += 1;
                    self.fire(tick);
                }
            }
        }
    }

    /// Start one run unless the previous one is still in flight.
    fn fire(&self, tick: u64) {
        // swap returns the previous state; true means a run is in flight.
        if self.running.swap(true, Ordering::SeqCst) {
            warn!(tick, "previous scrape run still in flight; dropping tick");
            self.events.emit(RatewatchEvent::RunSkipped { tick });
            return;
        }

        self.events.emit(RatewatchEvent::RunStarted { tick });
        let orchestrator = Arc::clone(&self.orchestrator);
        let events = Arc::clone(&self.events);
        let running = Arc::clone(&self.running);

        tokio::spawn(async move {
            let started = Instant::now();
            match orchestrator.run_all().await {
                Ok(summary) => {
                    info!(
                        tick,
                        sites_ok = summary.sites_ok,
                        sites_failed = summary.sites_failed,
                        written = summary.written,
                        skipped = summary.skipped,
                        dropped = summary.dropped,
                        "scrape run complete"
                    );
                    events.emit(RatewatchEvent::RunCompleted {
                        tick,
                        sites_ok: summary.sites_ok,
                        sites_failed: summary.sites_failed,
                        written: summary.written,
                        skipped: summary.skipped,
                        dropped: summary.dropped,
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    });
                }
                Err(e) => error!(tick, "scrape run failed: {e:#}"),
            }
            // A failed run still returns the scheduler to Idle.
            running.store(false, Ordering::SeqCst);
        });
    }
}

/// Acquire the shared browser, run the scheduler until interrupted, then
/// release the browser exactly once.
pub async fn start(
    config: ScrapeConfig,
    store: Arc<dyn RateStore>,
    events: Arc<EventBus>,
) -> Result<()> {
    let renderer: Arc<dyn Renderer> = Arc::new(
        ChromiumRenderer::new()
            .await
            .context("failed to acquire browser; refusing to start scheduler")?,
    );
    let prober: Arc<dyn SiteProber> = Arc::new(HttpProber::new()?);

    let orchestrator = Arc::new(Orchestrator::new(
        store,
        prober,
        Arc::clone(&renderer),
        Arc::clone(&events),
        config.clone(),
    ));
    let scheduler = Scheduler::new(orchestrator, config.cadence, Arc::clone(&events));

    events.emit(RatewatchEvent::RuntimeStarted {
        version: env!("CARGO_PKG_VERSION").to_string(),
        cadence_secs: config.cadence.as_secs(),
    });
    info!(
        cadence_secs = config.cadence.as_secs(),
        "ratewatch v{} scheduler started",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = scheduler.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            shutdown.notify_one();
        }
    });

    scheduler.run().await;

    renderer.shutdown().await?;
    Ok(())
}
