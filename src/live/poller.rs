use std::sync::PoisonError;

use log::{debug, info, warn};
use tokio::{
    sync::watch,
    task::{self, JoinHandle},
    time::{self, MissedTickBehavior},
};

use crate::{
    config::PollerConfig,
    models::BlockSummary,
    storage::{CacheError, FileCache},
    upstream::{ClientError, DataClient},
};

use super::{LeaderChange, PoolDirectory, SharedLiveState};

#[derive(Clone)]
pub struct Poller {
    client: DataClient,
    cache: FileCache,
    state: SharedLiveState,
    config: PollerConfig,
}

impl Poller {
    pub fn new(
        client: DataClient,
        cache: FileCache,
        state: SharedLiveState,
        config: PollerConfig,
    ) -> Self {
        Poller {
            client,
            cache,
            state,
            config,
        }
    }

    /// Fetches the latest block once and applies it to the shared state.
    pub async fn poll_once(&self) -> Result<Option<LeaderChange>, ClientError> {
        let block = self.client.latest_block().await?;
        Ok(self.apply(block).await)
    }

    async fn apply(&self, block: BlockSummary) -> Option<LeaderChange> {
        let novel = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_novel(&block);
        if !novel {
            return None;
        }

        let directory = self.load_directory().await;
        let change = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(block, &directory);
        if let Some(change) = &change {
            info!(
                "Block {} produced by {} ({})",
                change.height, change.pool_name, change.pool_id
            );
        }
        change
    }

    async fn load_directory(&self) -> PoolDirectory {
        let cache = self.cache.clone();
        match task::spawn_blocking(move || cache.read()).await {
            Ok(Ok(snapshot)) => PoolDirectory::from_pools(&snapshot.pools),
            Ok(Err(CacheError::Unavailable)) => PoolDirectory::default(),
            Ok(Err(e)) => {
                warn!("Could not load pools for leader lookup: {}", e);
                PoolDirectory::default()
            }
            Err(e) => {
                warn!("Pool lookup task failed: {}", e);
                PoolDirectory::default()
            }
        }
    }

    /// Polls immediately, then once per interval, until the returned handle
    /// is shut down or dropped. A block that arrives after either is discarded.
    pub fn spawn(self) -> PollerHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        PollerHandle { shutdown, task }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            let block = match self.client.latest_block().await {
                Ok(block) => block,
                Err(e) => {
                    warn!("Failed to fetch latest block: {}", e);
                    continue;
                }
            };

            // The request is never cancelled; drop its result if we were torn
            // down while it was in flight. A closed channel means the handle
            // was dropped.
            if *shutdown.borrow() || shutdown.has_changed().is_err() {
                debug!("Discarding block {} received after shutdown", block.height);
                break;
            }
            self.apply(block).await;
        }
        debug!("Block poller stopped");
    }
}

pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    pub async fn join(self) {
        self.shutdown();
        if let Err(e) = self.task.await {
            warn!("Block poller task failed: {}", e);
        }
    }
}
