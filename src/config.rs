use std::{path::PathBuf, time::Duration};

use clap::Args;

pub const DEFAULT_BASE_URL: &str = "https://cardano-mainnet.blockfrost.io/api/v0";
pub const PROJECT_ID_HEADER: &str = "project_id";

/// Settings for [`crate::upstream::DataClient`]. Bound once at construction and
/// passed explicitly, so tests can pair it with a mock transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub project_id: String,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    pub rate_limit_backoff: Duration,
    pub max_rate_limit_waits: Option<u32>, // None keeps waiting for as long as the upstream says 429
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, project_id: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            max_attempts: 3,
            retry_backoff: Duration::from_millis(1000),
            rate_limit_backoff: Duration::from_millis(2000),
            max_rate_limit_waits: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub max_pages: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            batch_size: 50,
            batch_delay: Duration::from_millis(1000),
            max_pages: 2000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub history_len: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        PollerConfig {
            interval: Duration::from_millis(15_000),
            history_len: 3,
        }
    }
}

/// Upstream flags shared by the server and the ingestion job.
#[derive(Args, Debug, Clone)]
pub struct UpstreamArgs {
    /// Credential sent in the `project_id` header.
    #[arg(long, env = "BLOCKFROST_PROJECT_ID", hide_env_values = true)]
    pub project_id: String,

    #[arg(long, env = "BLOCKFROST_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    #[arg(long, env = "CACHE_DIR", default_value = "cache")]
    pub cache_dir: PathBuf,
}

impl UpstreamArgs {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url, &self.project_id)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
