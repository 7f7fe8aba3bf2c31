use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::StakePool;

pub mod cache;

pub use cache::FileCache;

/// Result of one ingestion run. Replaced wholesale by the next run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    pub pools: Vec<StakePool>,
    pub last_update: DateTime<Utc>,
}

impl CacheSnapshot {
    pub fn total_pools(&self) -> usize {
        self.pools.len()
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("pool data not cached yet")]
    Unavailable,
    #[error("cached snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("cache i/o failed: {0}")]
    Io(#[from] std::io::Error),
}
