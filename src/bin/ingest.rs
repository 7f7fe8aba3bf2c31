//! One ingestion run: discover and enrich every pool, write the snapshot,
//! exit. Meant to be run from cron.

use std::{
    process::ExitCode,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use clap::Parser;
use dotenv::dotenv;
use log::{error, info};
use pool_bubbles::{
    config::{IngestConfig, UpstreamArgs},
    ingest::{IngestError, Ingestor},
    storage::{CacheError, FileCache},
    upstream::{DataClient, HttpTransport, TransportError},
};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "pool-ingest", about = "Fetches all stake pools into the local cache")]
struct Cli {
    #[command(flatten)]
    upstream: UpstreamArgs,

    #[arg(long, env = "BATCH_SIZE", default_value_t = 50)]
    batch_size: usize,

    /// Pause between enrichment batches, in milliseconds.
    #[arg(long, env = "BATCH_DELAY_MS", default_value_t = 1000)]
    batch_delay_ms: u64,

    /// Discovery gives up after this many non-empty pages.
    #[arg(long, env = "MAX_PAGES", default_value_t = 2000)]
    max_pages: u32,
}

#[derive(Debug, Error)]
enum JobError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

async fn run(cli: Cli) -> Result<(), JobError> {
    let transport = HttpTransport::new(cli.upstream.request_timeout())?;
    let client = DataClient::new(Arc::new(transport), cli.upstream.client_config());
    let ingestor = Ingestor::new(
        client,
        IngestConfig {
            batch_size: cli.batch_size,
            batch_delay: Duration::from_millis(cli.batch_delay_ms),
            max_pages: cli.max_pages,
        },
    );

    let started = Instant::now();
    let report = ingestor
        .run(|done, total| {
            if total > 0 {
                info!(
                    "Progress: {}/{} ({:.1}%)",
                    done,
                    total,
                    done as f64 * 100.0 / total as f64
                );
            }
        })
        .await?;

    info!(
        "Ingested {} of {} pools in {:.1}s ({} batches skipped, {} details failed, {} without metadata)",
        report.pools.len(),
        report.discovered,
        started.elapsed().as_secs_f64(),
        report.skipped_batches,
        report.failed_details,
        report.missing_metadata
    );

    FileCache::new(&cli.upstream.cache_dir).write(report.pools, Utc::now())?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Ingestion failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
