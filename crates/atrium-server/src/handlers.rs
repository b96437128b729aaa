use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::StringRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::Serialize;
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;

use atrium_content::{DetailData, OverviewData};
use atrium_core::events::CallbackEvent;
use atrium_core::ids::SessionId;

use crate::bus::{CallbackBus, ChannelHandle};
use crate::error::ApiError;
use crate::origin;
use crate::server::AppState;

/// Interval between keep-alive comments on an open stream. Short enough to
/// survive idle-timeout proxies.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Deregisters its channel when the owning SSE stream is dropped, whether
/// the client disconnected, the response errored, or the server is
/// shutting down.
struct StreamGuard {
    bus: Arc<CallbackBus>,
    handle: ChannelHandle,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.bus.unregister(&self.handle);
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// Overview page data: featured project, supporting projects, insights.
pub async fn overview_page() -> Json<OverviewData> {
    Json(atrium_content::overview())
}

/// Project detail page data.
pub async fn project_page(Path(slug): Path<String>) -> Result<Json<DetailData>, ApiError> {
    atrium_content::detail(&slug)
        .map(Json)
        .ok_or(ApiError::ProjectNotFound)
}

#[derive(Debug, Serialize)]
pub struct DemoSession {
    pub session_id: SessionId,
    pub callback_base_url: String,
}

/// Mint a fresh session id and the base URL external callers should POST
/// callbacks to. The id is minted here, never by the bus.
pub async fn demo_session(State(state): State<AppState>, headers: HeaderMap) -> Json<DemoSession> {
    let request_host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    let callback_base_url = origin::resolve_callback_base_url(
        state.config.callback_base_url.as_deref(),
        state.config.public_origin.as_deref(),
        &headers,
        "http",
        request_host,
    );

    Json(DemoSession {
        session_id: SessionId::new(),
        callback_base_url,
    })
}

/// Long-lived SSE stream for one session. Registers a channel on open and
/// deregisters it exactly once when the connection goes away.
pub async fn callback_stream(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    if session_id.trim().is_empty() {
        return ApiError::MissingSessionId.into_response();
    }

    let session_id = SessionId::from_raw(session_id);
    tracing::info!(session_id = %session_id, "callback stream opened");

    let (handle, rx) = state.bus.register(session_id);
    let guard = StreamGuard {
        bus: Arc::clone(&state.bus),
        handle,
    };

    let stream = ReceiverStream::new(rx).map(move |json| {
        // The guard lives as long as the stream; dropping the stream
        // deregisters the channel.
        let _held = &guard;
        Ok::<Event, Infallible>(Event::default().data(json))
    });

    let mut response = Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
        .into_response();
    let _ = response.headers_mut().insert(
        header::CACHE_CONTROL,
        axum::http::HeaderValue::from_static("no-cache, no-transform"),
    );
    response
}

/// Inbound webhook callback. The body is treated as JSON when it parses
/// and as a raw string otherwise; either way the publisher gets a 200.
pub async fn publish_callback(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    body: Result<String, StringRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if session_id.trim().is_empty() {
        return Err(ApiError::MissingSessionId);
    }

    let text = body.map_err(|err| ApiError::BodyRead(err.to_string()))?;
    let payload = serde_json::from_str::<serde_json::Value>(&text)
        .unwrap_or(serde_json::Value::String(text));

    let session_id = SessionId::from_raw(session_id);
    state
        .bus
        .publish(&session_id, CallbackEvent::callback(payload));

    Ok(Json(json!({ "ok": true })))
}
