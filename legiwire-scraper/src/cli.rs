//! Shared command-line driver
//!
//! Every jurisdiction scraper binary is a thin `main` that builds its
//! adapter and hands it to [`run`]: flag parsing, tracing setup, config
//! resolution, context construction, shutdown handling, and exit codes all
//! live here. Exit code is 0 on a normal run (including runs with reported
//! per-bill failures) and non-zero only on configuration errors.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::adapter::{BillContext, JurisdictionScraper};
use crate::clients::{FetchClient, HttpDocServiceClient, HttpMetadataClient, HttpPublisher};
use crate::context::{RegistrarOptions, ScrapeContext};
use crate::runner::{RunnerOptions, ScrapeRunner};
use legiwire_common::config::ScraperConfig;
use legiwire_common::events::EventBus;

/// Command-line arguments shared by all jurisdiction scrapers
#[derive(Parser, Debug)]
#[command(about = "legiwire jurisdiction scraper")]
#[command(version)]
pub struct Args {
    /// Internal session ids to scrape
    #[arg(short = 's', long = "sessions", required = true, num_args = 1..)]
    pub sessions: Vec<String>,

    /// Explicit bill ids (requires exactly one session); either bare ids
    /// or one JSON object mapping id to context
    #[arg(short = 'b', long = "bill-ids", num_args = 0..)]
    pub bill_ids: Vec<String>,

    /// Intersect the enumeration with this allowlist; unknown ids are a
    /// hard error
    #[arg(short = 'f', long = "filter-bill-ids", num_args = 0..)]
    pub filter_bill_ids: Vec<String>,

    /// Worker count
    #[arg(short = 'c', long = "concurrency", default_value = "1")]
    pub concurrency: usize,

    /// Skip integrity checks on content-addressed upload
    #[arg(long = "s3-skip-checks")]
    pub s3_skip_checks: bool,

    /// Force re-extraction of documents registered with this flag
    #[arg(long = "extraction-flag")]
    pub extraction_flag: Option<String>,

    /// Config file path (overrides LEGIWIRE_CONFIG and platform locations)
    #[arg(long = "config", env = "LEGIWIRE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Parse explicit bill ids: bare list, or a single JSON object id -> context
pub fn parse_bill_ids(args: &[String]) -> anyhow::Result<Option<HashMap<String, Option<BillContext>>>> {
    if args.is_empty() {
        return Ok(None);
    }
    if args.len() == 1 && args[0].trim_start().starts_with('{') {
        let map: HashMap<String, BillContext> =
            serde_json::from_str(&args[0]).context("invalid bill-ids JSON object")?;
        return Ok(Some(
            map.into_iter().map(|(id, ctx)| (id, Some(ctx))).collect(),
        ));
    }
    Ok(Some(
        args.iter().map(|id| (id.clone(), None)).collect(),
    ))
}

/// Run a jurisdiction scraper to completion
pub async fn run<S: JurisdictionScraper + 'static>(scraper: S) -> ExitCode {
    let args = Args::parse();
    run_with_args(scraper, args).await
}

/// Run with pre-parsed arguments (entry point for tests and embedders)
pub async fn run_with_args<S: JurisdictionScraper + 'static>(
    scraper: S,
    args: Args,
) -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "legiwire=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match execute(scraper, args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Run aborted");
            ExitCode::FAILURE
        }
    }
}

async fn execute<S: JurisdictionScraper + 'static>(scraper: S, args: Args) -> anyhow::Result<()> {
    let config = ScraperConfig::load(args.config.as_deref()).context("loading configuration")?;

    let fetcher = Arc::new(FetchClient::new(&config.http).context("building fetch client")?);
    let doc_service = Arc::new(
        HttpDocServiceClient::new(&config.doc_service).context("building doc-service client")?,
    );
    let metadata =
        Arc::new(HttpMetadataClient::new(&config.metadata).context("building metadata client")?);
    let publisher =
        Arc::new(HttpPublisher::new(&config.publisher).context("building publisher")?);
    let event_bus = Arc::new(EventBus::new(1000));

    // Logging drain so run events are visible even with no other observer
    let mut event_rx = event_bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            tracing::debug!(event_type = event.event_type(), "Scrape event");
        }
    });

    let locality = scraper.locality().to_string();
    let ctx = ScrapeContext::new(
        locality,
        fetcher,
        doc_service,
        metadata,
        publisher,
        event_bus,
    )
    .with_registrar_options(RegistrarOptions {
        s3_skip_checks: args.s3_skip_checks,
        extraction_flag: args.extraction_flag.clone(),
    });

    let runner = ScrapeRunner::new(scraper, ctx);
    let cancel = runner.cancellation_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received; draining in-flight bills");
        cancel.cancel();
    });

    let options = RunnerOptions {
        sessions: args.sessions,
        bill_ids: parse_bill_ids(&args.bill_ids)?,
        filter_bill_ids: args.filter_bill_ids,
        concurrency: args.concurrency,
    };

    let summary = runner.run(options).await?;
    tracing::info!(
        scraped = summary.scraped,
        failed = summary.failed,
        expected_failures = summary.expected_failures,
        duration_ms = summary.duration_ms,
        "Run summary"
    );
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
