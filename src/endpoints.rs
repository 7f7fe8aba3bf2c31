use std::sync::PoisonError;

use actix_web::{get, web, HttpResponse, Responder};
use log::error;
use serde::Deserialize;
use serde_json::json;

use crate::{
    live::SharedLiveState,
    render::{render, Viewport},
    storage::{CacheError, CacheSnapshot, FileCache},
    upstream::DataClient,
};

pub struct AppState {
    pub cache: FileCache,
    pub client: DataClient,
    pub live: SharedLiveState,
    pub viewport: Viewport,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_pools)
        .service(get_latest_block)
        .service(get_latest_epoch)
        .service(get_live)
        .service(get_render);
}

fn cache_error_response(e: CacheError) -> HttpResponse {
    match e {
        CacheError::Unavailable => HttpResponse::ServiceUnavailable().json(json!({
            "error": "Pool data not cached yet. Run the ingestion job first."
        })),
        e => {
            error!("Failed to read pool cache: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to read pool data"
            }))
        }
    }
}

/// Parses the snapshot on the blocking pool; it can be several megabytes.
async fn read_snapshot(state: &AppState) -> Result<CacheSnapshot, HttpResponse> {
    let cache = state.cache.clone();
    match web::block(move || cache.read()).await {
        Ok(read) => read.map_err(cache_error_response),
        Err(e) => {
            error!("Pool cache read was cancelled: {}", e);
            Err(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to read pool data"
            })))
        }
    }
}

#[get("/api/pools")]
pub async fn get_pools(state: web::Data<AppState>) -> impl Responder {
    match read_snapshot(&state).await {
        Ok(snapshot) => {
            let total_pools = snapshot.total_pools();
            HttpResponse::Ok().json(json!({
                "pools": snapshot.pools,
                "lastUpdate": snapshot.last_update,
                "totalPools": total_pools,
            }))
        }
        Err(response) => response,
    }
}

#[get("/api/blocks/latest")]
pub async fn get_latest_block(state: web::Data<AppState>) -> impl Responder {
    match state.client.latest_block().await {
        Ok(block) => HttpResponse::Ok().json(block),
        Err(e) => {
            error!("Failed to fetch latest block: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to fetch latest block"
            }))
        }
    }
}

#[get("/api/epochs/latest")]
pub async fn get_latest_epoch(state: web::Data<AppState>) -> impl Responder {
    match state.client.latest_epoch().await {
        Ok(epoch) => HttpResponse::Ok().json(epoch),
        Err(e) => {
            error!("Failed to fetch latest epoch: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "Failed to fetch latest epoch"
            }))
        }
    }
}

#[get("/api/live")]
pub async fn get_live(state: web::Data<AppState>) -> impl Responder {
    let view = state
        .live
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .view();
    HttpResponse::Ok().json(view)
}

#[derive(Deserialize, Debug, Default)]
pub struct RenderQuery {
    #[serde(default)]
    pub dark: bool,
}

#[get("/api/render")]
pub async fn get_render(
    state: web::Data<AppState>,
    query: web::Query<RenderQuery>,
) -> impl Responder {
    let snapshot = match read_snapshot(&state).await {
        Ok(snapshot) => snapshot,
        Err(response) => return response,
    };
    let leader = state
        .live
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .current_leader_id()
        .map(str::to_string);

    let instructions = render(
        &snapshot.pools,
        leader.as_deref(),
        query.dark,
        &state.viewport,
    );
    HttpResponse::Ok().json(instructions)
}
