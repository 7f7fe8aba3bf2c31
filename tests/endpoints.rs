mod common;

use std::{fs, sync::Arc, time::Duration};

use actix_web::{http::StatusCode, test, web, App};
use chrono::Utc;
use common::{block_json, client_config, MockTransport};
use pool_bubbles::{
    endpoints::{configure, AppState},
    live::{LiveState, PoolDirectory},
    models::{BlockSummary, PoolMetadata, StakePool},
    render::Viewport,
    storage::FileCache,
    upstream::DataClient,
};
use serde_json::{json, Value};

fn state(dir: &std::path::Path, transport: &Arc<MockTransport>) -> web::Data<AppState> {
    let mut config = client_config();
    config.retry_backoff = Duration::ZERO;
    web::Data::new(AppState {
        cache: FileCache::new(dir),
        client: DataClient::new(transport.clone(), config),
        live: LiveState::shared(3),
        viewport: Viewport::default(),
    })
}

fn pool(id: &str, name: &str) -> StakePool {
    StakePool {
        pool_id: id.to_string(),
        live_stake: "25000000".to_string(),
        blocks_minted: 4,
        active: true,
        metadata: Some(PoolMetadata {
            name: Some(name.to_string()),
            ticker: Some("TCK".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[actix_web::test]
async fn test_pools_not_cached_yet() {
    let dir = tempfile::tempdir().unwrap();
    let data = state(dir.path(), &MockTransport::new());
    let app = test::init_service(App::new().app_data(data).configure(configure)).await;

    let req = test::TestRequest::get().uri("/api/pools").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("not cached"));
}

#[actix_web::test]
async fn test_pools_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let data = state(dir.path(), &MockTransport::new());
    data.cache
        .write(vec![pool("pool1a", "A"), pool("pool1b", "B")], Utc::now())
        .unwrap();
    let app = test::init_service(App::new().app_data(data).configure(configure)).await;

    let req = test::TestRequest::get().uri("/api/pools").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["totalPools"], 2);
    assert_eq!(body["pools"].as_array().unwrap().len(), 2);
    assert_eq!(body["pools"][0]["metadata"]["name"], "A");
    assert!(body["lastUpdate"].is_string());
}

#[actix_web::test]
async fn test_pools_corrupt_cache() {
    let dir = tempfile::tempdir().unwrap();
    let data = state(dir.path(), &MockTransport::new());
    fs::write(data.cache.snapshot_path(), "not json").unwrap();
    let app = test::init_service(App::new().app_data(data).configure(configure)).await;

    let req = test::TestRequest::get().uri("/api/pools").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_latest_block_proxy() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::new();
    transport.json("/blocks/latest", block_json(1234, "pool1leader", 1_700_000_000));
    let app = test::init_service(
        App::new()
            .app_data(state(dir.path(), &transport))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/blocks/latest").to_request();
    let block: BlockSummary = test::call_and_read_body_json(&app, req).await;

    assert_eq!(block.height, 1234);
    assert_eq!(block.slot_leader, "pool1leader");
    assert_eq!(block.time, 1_700_000_000);
}

#[actix_web::test]
async fn test_latest_block_upstream_failure() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::new();
    transport.status("/blocks/latest", 502, "Bad Gateway");
    let app = test::init_service(
        App::new()
            .app_data(state(dir.path(), &transport))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/blocks/latest").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn test_latest_epoch_proxy() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MockTransport::new();
    transport.json(
        "/epochs/latest",
        json!({
            "epoch": 500,
            "start_time": 1_700_000_000,
            "end_time": 1_700_432_000,
            "first_block_time": 1_700_000_020,
            "last_block_time": 1_700_100_000,
            "block_count": 4_900,
            "tx_count": 61_000,
            "output": "1",
            "fees": "2",
            "active_stake": "22000000000000000"
        }),
    );
    let app = test::init_service(
        App::new()
            .app_data(state(dir.path(), &transport))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/epochs/latest").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["epoch"], 500);
    assert_eq!(body["block_count"], 4_900);
}

#[actix_web::test]
async fn test_live_view() {
    let dir = tempfile::tempdir().unwrap();
    let data = state(dir.path(), &MockTransport::new());
    let directory = PoolDirectory::from_pools(&[pool("pool1a", "Alpha")]);
    {
        let mut live = data.live.write().unwrap();
        for height in [7, 8] {
            live.observe(
                BlockSummary {
                    height,
                    slot_leader: "pool1a".to_string(),
                    ..Default::default()
                },
                &directory,
            );
        }
    }
    let app = test::init_service(App::new().app_data(data).configure(configure)).await;

    let req = test::TestRequest::get().uri("/api/live").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["currentLeader"]["poolId"], "pool1a");
    assert_eq!(body["currentLeader"]["poolName"], "Alpha");
    assert_eq!(body["history"][0]["uniqueId"], 8);
    assert_eq!(body["history"][1]["uniqueId"], 7);
    assert_eq!(body["history"][0]["poolName"], "Alpha");
}

#[actix_web::test]
async fn test_render_marks_current_leader() {
    let dir = tempfile::tempdir().unwrap();
    let data = state(dir.path(), &MockTransport::new());
    let pools = vec![pool("pool1a", "Alpha"), pool("pool1b", "Beta")];
    data.cache.write(pools.clone(), Utc::now()).unwrap();
    data.live.write().unwrap().observe(
        BlockSummary {
            height: 1,
            slot_leader: "pool1b".to_string(),
            ..Default::default()
        },
        &PoolDirectory::from_pools(&pools),
    );
    let app = test::init_service(App::new().app_data(data).configure(configure)).await;

    let req = test::TestRequest::get()
        .uri("/api/render?dark=true")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let nodes = body["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    let leader: Vec<&Value> = nodes.iter().filter(|n| n["isLeader"] == true).collect();
    assert_eq!(leader.len(), 1);
    assert_eq!(leader[0]["poolId"], "pool1b");
    assert!(leader[0]["hover"].is_null());
    assert!(leader[0]["effects"]["starburst"].is_array());
    assert_eq!(body["theme"]["background"], "#111827");
    assert_eq!(body["zoomExtent"], json!([0.5, 5.0]));
}

#[actix_web::test]
async fn test_render_not_cached_yet() {
    let dir = tempfile::tempdir().unwrap();
    let app = test::init_service(
        App::new()
            .app_data(state(dir.path(), &MockTransport::new()))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/render").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}
