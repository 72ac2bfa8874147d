// Copyright 2026 Ratewatch Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ratewatch::config::ScrapeConfig;
use ratewatch::events::EventBus;
use ratewatch::orchestrator::Orchestrator;
use ratewatch::probe::{HttpProber, SiteProber};
use ratewatch::renderer::chromium::ChromiumRenderer;
use ratewatch::renderer::Renderer;
use ratewatch::scheduler;
use ratewatch::store::sqlite::SqliteStore;
use ratewatch::store::RateStore;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "ratewatch",
    about = "Ratewatch — scheduled scraper for bank and exchange-office currency rates",
    version
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the scrape scheduler and run until interrupted
    Start,
    /// Run a single scrape pass and exit
    Run,
    /// Manage the registered exchanges
    Exchange {
        #[command(subcommand)]
        command: ExchangeCommands,
    },
    /// Show stored rates for an exchange, newest first
    Rates {
        /// Exchange id
        exchange: i64,
        /// Restrict to one canonical currency code
        #[arg(long)]
        currency: Option<String>,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum ExchangeCommands {
    /// Register an exchange and the URL of its rate page
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        location: String,
        /// Main site, used for the accessibility probe
        #[arg(long)]
        website: String,
        /// The page actually scraped for rates
        #[arg(long)]
        site: String,
    },
    /// List registered exchanges
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "ratewatch=debug" } else { "ratewatch=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse().unwrap()),
        )
        .init();

    let config = ScrapeConfig::from_env();
    let store: Arc<dyn RateStore> =
        Arc::new(SqliteStore::open(&config.db_path).context("failed to open rate store")?);

    match cli.command {
        Commands::Start => {
            let events = Arc::new(EventBus::new(256));
            scheduler::start(config, store, events).await
        }
        Commands::Run => run_once(config, store).await,
        Commands::Exchange { command } => match command {
            ExchangeCommands::Add {
                name,
                location,
                website,
                site,
            } => {
                let exchange = store
                    .insert_exchange(&name, &location, &website, &site)
                    .await?;
                println!("registered exchange {} ({})", exchange.id, exchange.name);
                Ok(())
            }
            ExchangeCommands::List => {
                for ex in store.list_exchanges().await? {
                    println!(
                        "{:>4}  {:<24} {:<16} {}",
                        ex.id, ex.name, ex.location, ex.exchange_site
                    );
                }
                Ok(())
            }
        },
        Commands::Rates {
            exchange,
            currency,
            limit,
        } => {
            let Some(ex) = store.get_exchange(exchange).await? else {
                anyhow::bail!("no exchange with id {exchange}");
            };
            for rate in store
                .list_rates(ex.id, currency.as_deref(), limit)
                .await?
            {
                println!(
                    "{}  {:<4} {:<4} {:>12.4}",
                    rate.date.format("%Y-%m-%d %H:%M:%S"),
                    rate.currency,
                    rate.side.as_str(),
                    rate.rate
                );
            }
            Ok(())
        }
    }
}

/// One scrape pass outside the scheduler: acquire the browser, run all
/// exchanges once, release the browser.
async fn run_once(config: ScrapeConfig, store: Arc<dyn RateStore>) -> Result<()> {
    let renderer: Arc<dyn Renderer> = Arc::new(
        ChromiumRenderer::new()
            .await
            .context("failed to acquire browser")?,
    );
    let prober: Arc<dyn SiteProber> = Arc::new(HttpProber::new()?);
    let events = Arc::new(EventBus::new(256));

    let orchestrator = Orchestrator::new(store, prober, Arc::clone(&renderer), events, config);
    let summary = orchestrator.run_all().await?;

    info!(
        sites_ok = summary.sites_ok,
        sites_failed = summary.sites_failed,
        written = summary.written,
        skipped = summary.skipped,
        dropped = summary.dropped,
        "scrape pass complete"
    );
    renderer.shutdown().await?;
    Ok(())
}
