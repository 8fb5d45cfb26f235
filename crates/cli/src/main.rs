//! sitescout command line.
//!
//! ```bash
//! # audit a few sites, one JSON line each on stdout
//! sitescout audit joes-diner.com https://bobs-barbers.example
//!
//! # only the leads
//! sitescout audit --below 55 $(cat sites.txt)
//!
//! # cache maintenance
//! sitescout cache stats
//! sitescout cache sweep
//! ```
//!
//! Logs go to stderr so stdout stays machine-readable. Ctrl-C abandons the
//! audit in flight and ends the run with the results printed so far.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use sitescout_client::{AuditEngine, PipelineEvent};
use sitescout_core::{AppConfig, AuditRequest, AuditResult, AuditStatus, AuditStore, CacheDb, ResultSource};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Default cutoff below which an audited site is a lead.
///
/// Businesses without a website are leads at any cutoff.
const DEFAULT_LEAD_THRESHOLD: u8 = 55;

#[derive(Debug, Parser)]
#[command(name = "sitescout")]
#[command(about = "Score small-business websites and surface redesign leads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Audit websites in order, printing one JSON line per result
    Audit {
        /// Websites to audit; an empty argument stands for a business without one
        #[arg(required = true)]
        urls: Vec<String>,

        /// Only print leads: sites scoring below this, plus businesses without one
        #[arg(long, value_name = "SCORE", num_args = 0..=1, default_missing_value = "55")]
        below: Option<u8>,

        /// Also scrape email, owner and social links
        #[arg(long)]
        contacts: bool,

        /// Skip the audit cache entirely
        #[arg(long)]
        no_cache: bool,
    },

    /// Inspect or maintain the audit cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Debug, Subcommand)]
enum CacheAction {
    /// Show stored and fresh entry counts
    Stats,
    /// Delete expired entries
    Sweep,
}

async fn open_cache(config: &AppConfig) -> Result<CacheDb> {
    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache at {}", config.db_path.display()))?;
    Ok(db.with_ttl(config.cache_ttl()))
}

/// One output line: the result with flattened details and its rating.
fn result_line(result: &AuditResult, source: ResultSource, threshold: u8) -> serde_json::Value {
    serde_json::json!({
        "correlationId": result.correlation_id,
        "url": result.normalized_url,
        "siteScore": result.site_score,
        "status": result.status,
        "rating": result.rating(),
        "lead": result.is_lead(threshold),
        "source": source,
        "subScores": result.sub_scores,
        "details": result.details.to_wire(),
    })
}

/// With `--below`, only leads reach stdout.
fn is_printed(result: &AuditResult, below: Option<u8>) -> bool {
    below.is_none_or(|threshold| result.is_lead(threshold))
}

#[derive(Debug, Default)]
struct Summary {
    audited: usize,
    without_site: usize,
    failed: usize,
    leads: usize,
    score_total: u64,
}

impl Summary {
    fn record(&mut self, result: &AuditResult, threshold: u8) {
        if result.is_lead(threshold) {
            self.leads += 1;
        }
        match result.status {
            AuditStatus::NoUrl => self.without_site += 1,
            AuditStatus::Error => self.failed += 1,
            AuditStatus::Audited => {
                self.audited += 1;
                self.score_total += u64::from(result.site_score);
            }
        }
    }

    fn average(&self) -> Option<u64> {
        (self.audited > 0).then(|| self.score_total / self.audited as u64)
    }
}

async fn audit(config: &AppConfig, urls: Vec<String>, below: Option<u8>, no_cache: bool) -> Result<()> {
    let store: Option<Arc<dyn AuditStore>> = if no_cache {
        None
    } else {
        match open_cache(config).await {
            Ok(db) => Some(Arc::new(db)),
            Err(e) => {
                tracing::warn!(error = %e, "running without cache");
                None
            }
        }
    };

    let engine = AuditEngine::from_config(config, store)?;
    let threshold = below.unwrap_or(DEFAULT_LEAD_THRESHOLD);

    let requests: Vec<AuditRequest> = urls
        .into_iter()
        .enumerate()
        .map(|(index, url)| AuditRequest::new(Some(url), (index + 1).to_string()))
        .collect();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupted, finishing up");
            on_interrupt.cancel();
        }
    });

    let mut summary = Summary::default();
    let mut events = Box::pin(engine.stream(requests, cancel));

    while let Some(event) = events.next().await {
        match event {
            PipelineEvent::Item { result, progress, source } => {
                tracing::info!(
                    completed = progress.completed,
                    total = progress.total,
                    score = result.site_score,
                    "audited {}",
                    result.normalized_url.as_deref().unwrap_or("(no website)")
                );
                summary.record(&result, threshold);
                if is_printed(&result, below) {
                    println!("{}", result_line(&result, source, threshold));
                }
            }
            PipelineEvent::Complete { cancelled } => {
                if cancelled {
                    eprintln!("cancelled");
                }
            }
        }
    }

    eprintln!(
        "audited {} ({} without a website, {} failed), {} leads under {}, average score {}",
        summary.audited,
        summary.without_site,
        summary.failed,
        summary.leads,
        threshold,
        summary.average().map_or_else(|| "n/a".to_string(), |avg| avg.to_string()),
    );

    Ok(())
}

async fn cache(config: &AppConfig, action: CacheAction) -> Result<()> {
    let db = open_cache(config).await?;
    match action {
        CacheAction::Stats => {
            let stats = db.stats().await?;
            println!("{}", serde_json::json!({ "audits": stats.audits, "fresh": stats.fresh }));
        }
        CacheAction::Sweep => {
            let removed = db.sweep().await?;
            println!("{}", serde_json::json!({ "removed": removed }));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load().context("failed to load configuration")?;

    match cli.command {
        Commands::Audit { urls, below, contacts, no_cache } => {
            config.contact_extraction |= contacts;
            audit(&config, urls, below, no_cache).await
        }
        Commands::Cache { action } => cache(&config, action).await,
    }
}
