use std::{io, sync::Arc, time::Duration};

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use dotenv::dotenv;
use log::info;
use pool_bubbles::{
    config::{PollerConfig, UpstreamArgs},
    endpoints::{configure, AppState},
    live::{LiveState, Poller},
    render::Viewport,
    storage::FileCache,
    upstream::{DataClient, HttpTransport},
};

#[derive(Parser, Debug)]
#[command(
    name = "pool-bubbles",
    about = "Serves cached stake pools and tracks the current slot leader"
)]
struct Cli {
    #[command(flatten)]
    upstream: UpstreamArgs,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    bind: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// How often the latest block is polled, in milliseconds.
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 15_000)]
    poll_interval_ms: u64,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let transport = HttpTransport::new(cli.upstream.request_timeout()).map_err(io::Error::other)?;
    let client = DataClient::new(Arc::new(transport), cli.upstream.client_config());
    let cache = FileCache::new(&cli.upstream.cache_dir);

    let poller_config = PollerConfig {
        interval: Duration::from_millis(cli.poll_interval_ms),
        ..Default::default()
    };
    let live = LiveState::shared(poller_config.history_len);
    let poller = Poller::new(client.clone(), cache.clone(), live.clone(), poller_config).spawn();

    let state = web::Data::new(AppState {
        cache,
        client,
        live,
        viewport: Viewport::default(),
    });

    info!("Listening on {}:{}", cli.bind, cli.port);
    let served = HttpServer::new(move || {
        App::new()
            .app_data(state.clone()) // Share dependencies
            .wrap(middleware::Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .configure(configure)
    })
    .bind((cli.bind.as_str(), cli.port))?
    .run()
    .await;

    poller.join().await;
    served
}
