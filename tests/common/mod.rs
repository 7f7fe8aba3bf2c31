#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use pool_bubbles::{
    config::ClientConfig,
    upstream::{DataClient, Transport, TransportError, TransportResponse},
};
use serde_json::{json, Value};

pub const BASE_URL: &str = "http://upstream.test/api/v0";
pub const PROJECT_ID: &str = "mainnetTestProject";

type Reply = Result<TransportResponse, TransportError>;

#[derive(Debug, Clone)]
pub struct Call {
    pub path: String,
    pub headers: Vec<(String, String)>,
}

/// Transport that answers from scripted replies keyed by path. The last reply
/// queued for a path repeats; unknown paths get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
    latency: Mutex<Duration>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(MockTransport::default())
    }

    pub fn reply(&self, path: &str, reply: Reply) {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn json(&self, path: &str, body: Value) {
        self.status(path, 200, &body.to_string());
    }

    pub fn status(&self, path: &str, status: u16, body: &str) {
        self.reply(
            path,
            Ok(TransportResponse {
                status,
                body: body.to_string(),
            }),
        );
    }

    /// Every reply is held back this long after the call is recorded.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        let path = url.strip_prefix(BASE_URL).unwrap_or(url).to_string();
        self.calls.lock().unwrap().push(Call {
            path: path.clone(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Ok(TransportResponse {
                status: 404,
                body: r#"{"error":"Not Found"}"#.to_string(),
            }),
        }
    }
}

pub fn client_config() -> ClientConfig {
    ClientConfig::new(BASE_URL, PROJECT_ID)
}

pub fn client(transport: &Arc<MockTransport>) -> DataClient {
    DataClient::new(transport.clone(), client_config())
}

pub fn pool_json(pool_id: &str, live_stake: &str, blocks_minted: u64) -> Value {
    json!({
        "pool_id": pool_id,
        "hex": format!("{}-hex", pool_id),
        "vrf_key": format!("{}-vrf", pool_id),
        "blocks_minted": blocks_minted,
        "blocks_epoch": 2,
        "live_stake": live_stake,
        "live_size": 0.0004,
        "live_saturation": 0.31,
        "live_delegators": 42,
        "active_stake": live_stake,
        "active_size": 0.0004,
        "declared_pledge": "500000000",
        "fixed_cost": "340000000",
        "owners": ["stake1uxyz"]
    })
}

pub fn metadata_json(pool_id: &str, name: &str, ticker: &str) -> Value {
    json!({
        "pool_id": pool_id,
        "hex": format!("{}-hex", pool_id),
        "url": "https://example.org/pool.json",
        "hash": "47c0c68cb57f4a5b4a87bad896fc274678e7aea98e200fa14a1cb40c0cab1d8c",
        "ticker": ticker,
        "name": name,
        "description": "A test pool",
        "homepage": "https://example.org"
    })
}

/// Scripts a healthy upstream: one page of `ids`, then an empty page, with
/// details and metadata for every id.
pub fn healthy_pools(transport: &MockTransport, ids: &[String]) {
    transport.json("/pools?page=1", json!(ids));
    transport.json("/pools?page=2", json!([]));
    for (i, id) in ids.iter().enumerate() {
        transport.json(
            &format!("/pools/{}", id),
            pool_json(id, &format!("{}", (i as u64 + 1) * 1_000_000_000), i as u64),
        );
        transport.json(
            &format!("/pools/{}/metadata", id),
            metadata_json(id, &format!("Pool {}", i), &format!("P{}", i)),
        );
    }
}

pub fn pool_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("pool1test{:04}", i)).collect()
}

pub fn block_json(height: u64, slot_leader: &str, time: i64) -> Value {
    json!({
        "time": time,
        "height": height,
        "hash": format!("hash{}", height),
        "slot": height * 20,
        "epoch": 500,
        "epoch_slot": 1000,
        "slot_leader": slot_leader,
        "size": 3,
        "tx_count": 1,
        "output": "128314491794",
        "fees": "592661",
        "block_vrf": "vrf_vk1",
        "previous_block": format!("hash{}", height.saturating_sub(1)),
        "next_block": null,
        "confirmations": 0
    })
}
