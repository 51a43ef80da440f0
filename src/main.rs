mod config;
mod error;
mod history;
mod kv;
mod match_engine;
mod matchmaking;
mod mmr;
mod model;
mod net;
mod persistence;
mod physics;
mod protocol;
mod weapon;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tracing::{error, info, warn};

use error::AppError;
use match_engine::lifecycle::MatchRegistry;
use net::connection::{extract_identity, handle_connection};
use persistence::Database;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    if let Err(e) = run().await {
        error!(%e, "fatal startup error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let db = Arc::new(Database::new(config::SQLITE_PATH).map_err(|e| AppError::Startup(format!("failed to open database: {e}")))?);
    let kv_store = kv::Kv::connect(config::REDIS_URL)
        .await
        .map_err(|e| AppError::Startup(format!("failed to connect to redis: {e}")))?;
    let registry = MatchRegistry::new();

    tokio::spawn(matchmaking::run_matcher_loop(kv_store.clone(), db.clone(), registry.clone()));

    let addr = format!("0.0.0.0:{}", config::GATEWAY_PORT);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Startup(format!("failed to bind {addr}: {e}")))?;

    info!("Outlast gateway listening on ws://{addr}");
    info!("Tick rate: {} Hz ({}ms)", config::TICK_RATE_HZ, config::TICK_INTERVAL_MS);

    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(v) => v,
            Err(e) => {
                warn!("accept error: {e}");
                continue;
            }
        };

        let kv_clone = kv_store.clone();
        let registry_clone = registry.clone();

        tokio::spawn(async move {
            let mut identity: Option<String> = None;
            let callback = |req: &Request, resp: Response| {
                let headers: Vec<(String, String)> = req
                    .headers()
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or_default().to_string()))
                    .collect();
                identity = extract_identity(req.uri().to_string().as_str(), &headers);
                Ok(resp)
            };

            let ws_stream = match tokio_tungstenite::accept_hdr_async(stream, callback).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!("websocket handshake failed for {peer_addr}: {e}");
                    return;
                }
            };

            let Some(identity) = identity else {
                warn!("rejecting connection from {peer_addr}: no identity token");
                return;
            };

            info!(identity = %identity, %peer_addr, "connection established");
            handle_connection(ws_stream, identity, kv_clone, registry_clone).await;
        });
    }
}
