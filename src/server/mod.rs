//! Web front-end: a single chat page plus the JSON/SSE API it talks to.

pub mod error;
pub mod routes;

pub use error::ApiError;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::ChatConfig;
use crate::error::Result;
use crate::session::SessionStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ChatConfig>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: ChatConfig, sessions: SessionStore) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
        }
    }
}

/// Build the router without binding a socket.
///
/// No CORS layer: only same-origin pages may call the API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index_handler))
        .route("/health", get(routes::health_handler))
        .route("/api/config", get(routes::config_handler))
        .route("/api/sessions", post(routes::create_session_handler))
        .route("/api/sessions/{id}", delete(routes::end_session_handler))
        .route(
            "/api/sessions/{id}/messages",
            get(routes::transcript_handler).post(routes::send_handler),
        )
        .route("/api/sessions/{id}/stream", post(routes::stream_handler))
        .route("/api/sessions/{id}/clear", post(routes::clear_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `state.config.bind` and serve until Ctrl-C.
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.bind.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        model = state.config.model.as_str(),
        api_key_from_env = state.config.api_key_from_env,
        "Server running on http://{addr}"
    );

    let sweeper = spawn_session_sweeper(&state);
    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sweeper.abort();
    served?;
    Ok(())
}

/// Periodically drop sessions whose tab went away without ending them.
pub fn spawn_session_sweeper(state: &AppState) -> JoinHandle<()> {
    let sessions = state.sessions.clone();
    let max_idle = state.config.session_idle_timeout();
    let period = (max_idle / 4).max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = sessions.evict_idle(max_idle);
            if evicted > 0 {
                debug!(evicted, remaining = sessions.len(), "Swept idle sessions");
            }
        }
    })
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        // No signal handler available: run until killed.
        Err(_) => std::future::pending::<()>().await,
    }
}
