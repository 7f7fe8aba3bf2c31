//! Latest-block tracking for the slot-leader highlight.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, RwLock},
};

use serde::Serialize;

use crate::models::{BlockSummary, StakePool, UNKNOWN_POOL};

pub mod poller;

pub use poller::{Poller, PollerHandle};

pub type SharedLiveState = Arc<RwLock<LiveState>>;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub block: BlockSummary,
    pub pool_name: String,
    pub unique_id: u64, // Block height
}

/// Newest-first ring of recently observed blocks, at most one per height.
#[derive(Debug, Clone)]
pub struct BlockHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl BlockHistory {
    pub fn new(capacity: usize) -> Self {
        BlockHistory {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.retain(|e| e.unique_id != entry.unique_id);
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderChange {
    pub pool_id: String,
    pub pool_name: String,
    pub height: u64,
}

/// Pool id to display name lookup built from a cache snapshot.
#[derive(Debug, Clone, Default)]
pub struct PoolDirectory {
    names: HashMap<String, String>,
}

impl PoolDirectory {
    pub fn from_pools(pools: &[StakePool]) -> Self {
        PoolDirectory {
            names: pools
                .iter()
                .map(|p| (p.pool_id.clone(), p.display_name().to_string()))
                .collect(),
        }
    }

    pub fn name_of(&self, pool_id: &str) -> &str {
        self.names
            .get(pool_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_POOL)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LiveView {
    pub current_leader: Option<LeaderChange>,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone)]
pub struct LiveState {
    last_height: Option<u64>,
    current_leader: Option<LeaderChange>,
    history: BlockHistory,
}

impl LiveState {
    pub fn new(history_len: usize) -> Self {
        LiveState {
            last_height: None,
            current_leader: None,
            history: BlockHistory::new(history_len),
        }
    }

    pub fn shared(history_len: usize) -> SharedLiveState {
        Arc::new(RwLock::new(LiveState::new(history_len)))
    }

    /// A block is novel when its height differs from the last one seen.
    /// Other fields are not compared.
    pub fn is_novel(&self, block: &BlockSummary) -> bool {
        self.last_height != Some(block.height)
    }

    /// Records `block` if it is novel and returns the resulting leader change.
    /// Repeated heights leave the state untouched.
    pub fn observe(
        &mut self,
        block: BlockSummary,
        directory: &PoolDirectory,
    ) -> Option<LeaderChange> {
        if !self.is_novel(&block) {
            return None;
        }
        self.last_height = Some(block.height);

        let pool_name = directory.name_of(&block.slot_leader).to_string();
        let change = LeaderChange {
            pool_id: block.slot_leader.clone(),
            pool_name: pool_name.clone(),
            height: block.height,
        };
        self.current_leader = Some(change.clone());
        self.history.push(HistoryEntry {
            unique_id: block.height,
            pool_name,
            block,
        });
        Some(change)
    }

    pub fn last_height(&self) -> Option<u64> {
        self.last_height
    }

    pub fn current_leader(&self) -> Option<&LeaderChange> {
        self.current_leader.as_ref()
    }

    pub fn current_leader_id(&self) -> Option<&str> {
        self.current_leader.as_ref().map(|l| l.pool_id.as_str())
    }

    pub fn history(&self) -> &BlockHistory {
        &self.history
    }

    pub fn view(&self) -> LiveView {
        LiveView {
            current_leader: self.current_leader.clone(),
            history: self.history.iter().cloned().collect(),
        }
    }
}
