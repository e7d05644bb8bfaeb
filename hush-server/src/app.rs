use crate::{RoomRegistry, ServerConfig, SignalingService, create_room, get_room, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::extract::FromRef;
use axum::routing::{get, post};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub signaling: SignalingService,
    pub rooms: RoomRegistry,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            signaling: SignalingService::new(config.ice_servers.clone()),
            rooms: RoomRegistry::new(),
        }
    }
}

impl FromRef<AppState> for SignalingService {
    fn from_ref(state: &AppState) -> Self {
        state.signaling.clone()
    }
}

impl FromRef<AppState> for RoomRegistry {
    fn from_ref(state: &AppState) -> Self {
        state.rooms.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Hush Server running!" }))
        .route("/ws", get(ws_handler))
        .route("/rooms", post(create_room))
        .route("/rooms/{code}", get(get_room))
        .with_state(state)
}

/// Binds the listener and serves in a background task. Returns the bound address,
/// which differs from the configured one when port 0 was requested.
pub async fn spawn(config: ServerConfig) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    let addr = listener.local_addr()?;
    let app = router(AppState::new(&config));

    info!("Server running on http://{}", addr);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server stopped: {}", e);
        }
    });
    Ok((addr, handle))
}

/// Serves until the process is interrupted.
pub async fn run(config: ServerConfig) -> Result<()> {
    let (_, handle) = spawn(config).await?;
    tokio::select! {
        res = handle => res.context("Server task panicked")?,
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for ctrl-c")?;
            info!("Shutting down");
        }
    }
    Ok(())
}
