//! HTTP handlers.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Html;
use axum::Json;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tracing::debug;

use crate::error::ChatError;
use crate::models::GeminiModel;
use crate::session::{FormSettings, SessionId, SessionSnapshot, TurnOutcome};

use super::{ApiError, AppState};

const INDEX_HTML: &str = include_str!("index.html");

/// Body of a send/stream request: the message plus the current form values.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub message: String,
    #[serde(flatten)]
    pub settings: FormSettings,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub models: Vec<GeminiModel>,
    pub default_model: GeminiModel,
    pub has_api_key: bool,
    pub api_key_from_env: bool,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub id: SessionId,
}

pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}

pub async fn config_handler(State(state): State<AppState>) -> Json<ConfigResponse> {
    let config = &state.config;
    Json(ConfigResponse {
        models: GeminiModel::all(),
        default_model: config.model,
        has_api_key: config.has_api_key(),
        api_key_from_env: config.api_key_from_env,
        system_prompt: config.system_prompt.clone(),
    })
}

pub async fn create_session_handler(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionCreated>) {
    let id = state.sessions.create();
    (StatusCode::CREATED, Json(SessionCreated { id }))
}

pub async fn end_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = session_id(&id)?;
    if state.sessions.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ChatError::SessionNotFound(id.to_string()).into())
    }
}

pub async fn transcript_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let id = session_id(&id)?;
    let session = state.sessions.get(id)?;
    let snapshot = session.lock().await.snapshot();
    Ok(Json(snapshot))
}

pub async fn send_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SendRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    let id = session_id(&id)?;
    let session = state.sessions.get(id)?;
    let mut session = session.lock().await;
    let outcome = session
        .submit(&state.config, &request.settings, &request.message)
        .await?;
    Ok(Json(outcome))
}

/// Stream one turn as server-sent events.
///
/// Events: `delta` `{text}` per chunk, then exactly one of `done`
/// `{text, usage}`, `error` `{message}` or `guidance` `{message}`.
pub async fn stream_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SendRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let id = session_id(&id)?;
    let session = state.sessions.get(id)?;
    let (tx, rx) = mpsc::unbounded_channel::<Event>();

    // The turn runs to completion even if the client goes away, so the
    // history never ends up half-written.
    tokio::spawn(async move {
        let mut session = session.lock().await;
        let delta_tx = tx.clone();
        let outcome = session
            .submit_streaming(&state.config, &request.settings, &request.message, move |text| {
                let _ = delta_tx.send(sse_event("delta", json!({ "text": text })));
            })
            .await;

        let last = match outcome {
            Ok(TurnOutcome::Reply(reply)) if reply.is_error() => {
                sse_event("error", json!({ "message": reply.text }))
            }
            Ok(TurnOutcome::Reply(reply)) => {
                sse_event("done", json!({ "text": reply.text, "usage": reply.usage }))
            }
            Ok(TurnOutcome::Guidance { message }) => {
                sse_event("guidance", json!({ "message": message }))
            }
            Err(err) => sse_event("error", json!({ "message": format!("Error: {err}") })),
        };
        if tx.send(last).is_err() {
            debug!(session = %id, "Stream client disconnected before completion");
        }
    });

    let stream = UnboundedReceiverStream::new(rx).map(Ok::<Event, Infallible>);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

pub async fn clear_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let id = session_id(&id)?;
    let session = state.sessions.get(id)?;
    let mut session = session.lock().await;
    session.clear();
    Ok(Json(session.snapshot()))
}

/// Malformed ids are reported like unknown ones.
fn session_id(raw: &str) -> Result<SessionId, ApiError> {
    Ok(raw.parse::<SessionId>()?)
}

fn sse_event(name: &str, data: serde_json::Value) -> Event {
    Event::default().event(name).data(data.to_string())
}
