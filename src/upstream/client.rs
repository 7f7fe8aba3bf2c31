use std::sync::Arc;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    config::{ClientConfig, PROJECT_ID_HEADER},
    models::{BlockSummary, EpochSummary, PoolMetadata, StakePool},
};

use super::{Transport, TransportError};

/// Why the last attempt of a call failed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FailureCause {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{endpoint} failed after {attempts} attempt(s): {cause}")]
    Exhausted {
        endpoint: String,
        attempts: u32,
        cause: FailureCause,
    },
    #[error("{endpoint} still rate limited after {waits} wait(s)")]
    RateLimited { endpoint: String, waits: u32 },
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Exhausted {
                cause: FailureCause::Status(status),
                ..
            } => Some(*status),
            _ => None,
        }
    }

    /// The credential was rejected; no other call with it can succeed either.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Quota exhausted or client banned: every call in flight is failing for
    /// the same reason, not just this one.
    pub fn is_systemic(&self) -> bool {
        matches!(self.status(), Some(402) | Some(418))
    }
}

#[derive(Clone)]
pub struct DataClient {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl DataClient {
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        DataClient { transport, config }
    }

    /// GET `endpoint` relative to the base URL and decode the JSON body.
    ///
    /// A 429 waits `n * rate_limit_backoff` (n = 429s seen so far) and does not
    /// use up an attempt. Any other failure waits `attempt * retry_backoff` and
    /// tries again until `max_attempts` is reached.
    ///
    /// The 429 wait scales with the 429 count, not the attempt number, so a
    /// 429 that follows a 5xx still waits `1 * rate_limit_backoff`.
    pub async fn fetch<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        let url = format!("{}{}", self.config.base_url, endpoint);
        let headers = [(PROJECT_ID_HEADER, self.config.project_id.as_str())];
        let max_attempts = self.config.max_attempts.max(1);

        let mut attempt: u32 = 1;
        let mut rate_limited: u32 = 0;
        loop {
            let cause = match self.transport.get(&url, &headers).await {
                Ok(res) if res.status == 429 => {
                    if let Some(limit) = self.config.max_rate_limit_waits {
                        if rate_limited >= limit {
                            return Err(ClientError::RateLimited {
                                endpoint: endpoint.to_string(),
                                waits: rate_limited,
                            });
                        }
                    }
                    rate_limited += 1;
                    let wait = self.config.rate_limit_backoff * rate_limited;
                    warn!("Rate limited on {}, waiting {:?}", endpoint, wait);
                    tokio::time::sleep(wait).await;
                    continue;
                }
                Ok(res) if res.is_success() => {
                    return serde_json::from_str(&res.body).map_err(|e| ClientError::Decode {
                        endpoint: endpoint.to_string(),
                        source: e,
                    });
                }
                Ok(res) => FailureCause::Status(res.status),
                Err(e) => FailureCause::Transport(e),
            };

            if attempt >= max_attempts {
                return Err(ClientError::Exhausted {
                    endpoint: endpoint.to_string(),
                    attempts: attempt,
                    cause,
                });
            }
            let wait = self.config.retry_backoff * attempt;
            debug!(
                "Attempt {} for {} failed ({}), retrying in {:?}",
                attempt, endpoint, cause, wait
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }

    pub async fn pool_ids(&self, page: u32) -> Result<Vec<String>, ClientError> {
        self.fetch(&format!("/pools?page={}", page)).await
    }

    pub async fn pool(&self, pool_id: &str) -> Result<StakePool, ClientError> {
        self.fetch(&format!("/pools/{}", pool_id)).await
    }

    pub async fn pool_metadata(&self, pool_id: &str) -> Result<PoolMetadata, ClientError> {
        self.fetch(&format!("/pools/{}/metadata", pool_id)).await
    }

    pub async fn latest_block(&self) -> Result<BlockSummary, ClientError> {
        self.fetch("/blocks/latest").await
    }

    pub async fn latest_epoch(&self) -> Result<EpochSummary, ClientError> {
        self.fetch("/epochs/latest").await
    }
}
