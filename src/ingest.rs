//! Discovery + enrichment of every registered pool.
//!
//! Discovery pages through `/pools?page=N` until an empty page. Enrichment
//! then walks the identifiers in fixed-size batches: details for a batch are
//! requested concurrently, metadata is attached afterwards, and batches are
//! separated by a flat delay to stay under the upstream rate limit.

use futures::future::join_all;
use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    config::IngestConfig,
    models::StakePool,
    upstream::{ClientError, DataClient},
};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("pool discovery failed on page {page}: {source}")]
    Discovery {
        page: u32,
        #[source]
        source: ClientError,
    },
    #[error("pool discovery exceeded {max_pages} pages without reaching an empty page")]
    PageCeiling { max_pages: u32 },
    #[error("upstream rejected the credential: {0}")]
    Unauthorized(#[source] ClientError),
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub pools: Vec<StakePool>,
    pub discovered: usize,
    pub batches: usize,
    pub skipped_batches: usize,
    pub failed_details: usize,
    pub missing_metadata: usize,
}

enum BatchError {
    Unauthorized(ClientError),
    Systemic(ClientError),
}

struct BatchOutcome {
    pools: Vec<StakePool>,
    failed_details: usize,
    missing_metadata: usize,
}

pub struct Ingestor {
    client: DataClient,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(client: DataClient, config: IngestConfig) -> Self {
        Ingestor { client, config }
    }

    /// Runs one full ingestion pass. `progress` receives `(processed, total)`
    /// identifier counts: once after discovery and once after every batch.
    pub async fn run<F>(&self, mut progress: F) -> Result<IngestReport, IngestError>
    where
        F: FnMut(usize, usize),
    {
        let ids = self.discover().await?;
        let total = ids.len();
        info!("Discovered {} pools", total);
        progress(0, total);

        let mut report = IngestReport {
            discovered: total,
            ..Default::default()
        };

        let batch_size = self.config.batch_size.max(1);
        let batch_count = total.div_ceil(batch_size);
        let mut processed = 0;

        for (index, batch) in ids.chunks(batch_size).enumerate() {
            report.batches += 1;
            match self.enrich_batch(batch).await {
                Ok(outcome) => {
                    report.failed_details += outcome.failed_details;
                    report.missing_metadata += outcome.missing_metadata;
                    report.pools.extend(outcome.pools);
                }
                Err(BatchError::Unauthorized(e)) => return Err(IngestError::Unauthorized(e)),
                Err(BatchError::Systemic(e)) => {
                    warn!(
                        "Skipping batch {}/{} ({} pools): {}",
                        index + 1,
                        batch_count,
                        batch.len(),
                        e
                    );
                    report.skipped_batches += 1;
                }
            }

            processed += batch.len();
            progress(processed, total);

            if index + 1 < batch_count {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        Ok(report)
    }

    async fn discover(&self) -> Result<Vec<String>, IngestError> {
        let mut ids = Vec::new();
        for page in 1..=self.config.max_pages {
            let page_ids = self
                .client
                .pool_ids(page)
                .await
                .map_err(|e| IngestError::Discovery { page, source: e })?;
            if page_ids.is_empty() {
                return Ok(ids);
            }
            debug!("Page {}: {} pool ids", page, page_ids.len());
            ids.extend(page_ids);
        }
        Err(IngestError::PageCeiling {
            max_pages: self.config.max_pages,
        })
    }

    async fn enrich_batch(&self, batch: &[String]) -> Result<BatchOutcome, BatchError> {
        let details = join_all(batch.iter().map(|id| self.client.pool(id))).await;

        let mut pools = Vec::with_capacity(batch.len());
        let mut failed_details = 0;
        for (id, detail) in batch.iter().zip(details) {
            match detail {
                Ok(pool) => pools.push(pool),
                Err(e) if e.is_unauthorized() => return Err(BatchError::Unauthorized(e)),
                Err(e) if e.is_systemic() => return Err(BatchError::Systemic(e)),
                Err(e) => {
                    warn!("Failed to fetch pool {}: {}", id, e);
                    failed_details += 1;
                }
            }
        }

        let metadata = join_all(pools.iter().map(|pool| async move {
            if pool.pool_id.is_empty() {
                return None;
            }
            match self.client.pool_metadata(&pool.pool_id).await {
                Ok(metadata) if !metadata.is_empty() => Some(metadata),
                Ok(_) => None,
                Err(e) => {
                    warn!("Failed to fetch metadata for {}: {}", pool.pool_id, e);
                    None
                }
            }
        }))
        .await;

        let mut missing_metadata = 0;
        for (pool, metadata) in pools.iter_mut().zip(metadata) {
            if metadata.is_none() {
                missing_metadata += 1;
            }
            pool.metadata = metadata;
            pool.active = true;
        }

        Ok(BatchOutcome {
            pools,
            failed_details,
            missing_metadata,
        })
    }
}
