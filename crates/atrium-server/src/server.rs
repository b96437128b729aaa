use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::bus::CallbackBus;
use crate::handlers;

/// Every response carries this directive; the site is a private demo
/// surface and must stay out of indexes.
const ROBOTS_VALUE: &str = "noindex, nofollow, noarchive, nosnippet, noimageindex";

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    /// Bound of each stream channel's send queue.
    pub max_send_queue: usize,
    /// Public origin the site is served under, consulted during callback
    /// base URL resolution.
    pub public_origin: Option<String>,
    /// Manual override for the callback base URL. Wins over everything
    /// when it parses as an absolute URL.
    pub callback_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            max_send_queue: 256,
            public_origin: None,
            callback_base_url: None,
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub bus: Arc<CallbackBus>,
    pub config: Arc<ServerConfig>,
}

/// Build the Axum router with all routes and layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/pages/overview", get(handlers::overview_page))
        .route("/api/pages/projects/{slug}", get(handlers::project_page))
        .route("/api/demo/session", get(handlers::demo_session))
        .route(
            "/api/callbacks/stream/{session_id}",
            get(handlers::callback_stream),
        )
        .route("/api/callbacks/{session_id}", post(handlers::publish_callback))
        .with_state(state)
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-robots-tag"),
            HeaderValue::from_static(ROBOTS_VALUE),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Create and start the server. Returns a handle that keeps the serving
/// task alive and exposes the bound port (useful with port 0 in tests).
pub async fn start(config: ServerConfig) -> Result<ServerHandle, std::io::Error> {
    let bus = Arc::new(CallbackBus::new(config.max_send_queue));
    let port = config.port;

    let state = AppState {
        bus: Arc::clone(&bus),
        config: Arc::new(config),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "atrium server started");

    let server = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            tracing::error!(error = %err, "server task exited");
        }
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        bus,
        _server: server,
    })
}

/// Handle returned by `start()`.
pub struct ServerHandle {
    pub port: u16,
    pub bus: Arc<CallbackBus>,
    _server: tokio::task::JoinHandle<()>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_core::events::WireEvent;
    use atrium_core::ids::SessionId;
    use futures::StreamExt;
    use serde_json::json;
    use std::time::Duration;

    async fn spawn_server() -> ServerHandle {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        start(config).await.unwrap()
    }

    fn url(handle: &ServerHandle, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", handle.port)
    }

    /// Read SSE frames off a byte stream until one `data:` event has been
    /// seen, then return it decoded. Comment-only frames are skipped.
    async fn next_data_event<S>(buffer: &mut String, bytes: &mut S) -> WireEvent
    where
        S: futures::Stream<Item = reqwest::Result<bytes::Bytes>> + Unpin,
    {
        loop {
            while let Some(frame_end) = buffer.find("\n\n") {
                let frame = buffer[..frame_end].to_string();
                buffer.drain(..frame_end + 2);
                if let Some(data) = frame
                    .lines()
                    .find_map(|line| line.strip_prefix("data:"))
                {
                    return serde_json::from_str(data.trim()).expect("wire event parses");
                }
            }
            let chunk = tokio::time::timeout(Duration::from_secs(5), bytes.next())
                .await
                .expect("stream produced a chunk in time")
                .expect("stream not closed")
                .expect("chunk read ok");
            buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }

    #[tokio::test]
    async fn server_starts_and_serves_health() {
        let handle = spawn_server().await;
        assert!(handle.port > 0);

        let resp = reqwest::get(url(&handle, "/health")).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("x-robots-tag").unwrap(),
            "noindex, nofollow, noarchive, nosnippet, noimageindex"
        );

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn overview_and_detail_pages() {
        let handle = spawn_server().await;

        let overview: serde_json::Value = reqwest::get(url(&handle, "/api/pages/overview"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let featured_slug = overview["featured"]["slug"].as_str().unwrap().to_string();
        assert!(overview["supporting"].as_array().unwrap().len() >= 1);

        let detail = reqwest::get(url(&handle, &format!("/api/pages/projects/{featured_slug}")))
            .await
            .unwrap();
        assert_eq!(detail.status(), 200);

        let missing = reqwest::get(url(&handle, "/api/pages/projects/nope"))
            .await
            .unwrap();
        assert_eq!(missing.status(), 404);
        let body: serde_json::Value = missing.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn demo_session_resolves_local_origin() {
        let handle = spawn_server().await;

        let body: serde_json::Value = reqwest::get(url(&handle, "/api/demo/session"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(body["session_id"].as_str().unwrap().starts_with("sess_"));
        assert_eq!(
            body["callback_base_url"].as_str().unwrap(),
            &format!("http://127.0.0.1:{}", handle.port)
        );
    }

    #[tokio::test]
    async fn stream_receives_ack_then_published_callback() {
        let handle = spawn_server().await;

        let resp = reqwest::get(url(&handle, "/api/callbacks/stream/tab-1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "text/event-stream"
        );

        let mut buffer = String::new();
        let mut bytes = resp.bytes_stream();

        let ack = next_data_event(&mut buffer, &mut bytes).await;
        assert_eq!(ack.kind, "connected");

        let publish = reqwest::Client::new()
            .post(url(&handle, "/api/callbacks/tab-1"))
            .body(r#"{"x":1}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(publish.status(), 200);
        let body: serde_json::Value = publish.json().await.unwrap();
        assert_eq!(body, json!({ "ok": true }));

        let event = next_data_event(&mut buffer, &mut bytes).await;
        assert_eq!(event.kind, "callback");
        assert_eq!(event.payload, Some(json!({"x": 1})));
    }

    #[tokio::test]
    async fn malformed_publish_body_reaches_stream_as_raw_text() {
        let handle = spawn_server().await;

        let resp = reqwest::get(url(&handle, "/api/callbacks/stream/tab-2"))
            .await
            .unwrap();
        let mut buffer = String::new();
        let mut bytes = resp.bytes_stream();
        let _ack = next_data_event(&mut buffer, &mut bytes).await;

        let publish = reqwest::Client::new()
            .post(url(&handle, "/api/callbacks/tab-2"))
            .body("not-json")
            .send()
            .await
            .unwrap();
        assert_eq!(publish.status(), 200);

        let event = next_data_event(&mut buffer, &mut bytes).await;
        assert_eq!(event.payload, Some(json!("not-json")));
    }

    #[tokio::test]
    async fn blank_session_id_is_rejected_on_both_endpoints() {
        let handle = spawn_server().await;

        let stream = reqwest::get(url(&handle, "/api/callbacks/stream/%20"))
            .await
            .unwrap();
        assert_eq!(stream.status(), 400);
        assert_eq!(handle.bus.session_count(), 0);

        let publish = reqwest::Client::new()
            .post(url(&handle, "/api/callbacks/%20"))
            .body("{}")
            .send()
            .await
            .unwrap();
        assert_eq!(publish.status(), 400);
        let body: serde_json::Value = publish.json().await.unwrap();
        assert_eq!(body["error"], "Missing session id");
    }

    #[tokio::test]
    async fn publish_without_listener_is_fire_and_forget() {
        let handle = spawn_server().await;

        let publish = reqwest::Client::new()
            .post(url(&handle, "/api/callbacks/never-connected"))
            .body(r#"{"ignored":true}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(publish.status(), 200);
        assert!(!handle.bus.has_session(&SessionId::from_raw("never-connected")));
    }

    #[tokio::test]
    async fn client_disconnect_deregisters_channel() {
        let handle = spawn_server().await;

        let resp = reqwest::get(url(&handle, "/api/callbacks/stream/tab-3"))
            .await
            .unwrap();
        let mut buffer = String::new();
        let mut bytes = resp.bytes_stream();
        let _ack = next_data_event(&mut buffer, &mut bytes).await;
        assert!(handle.bus.has_session(&SessionId::from_raw("tab-3")));

        drop(bytes);

        // Deregistration is prompt (drop guard), but the server only
        // observes the closed socket on its side of the connection.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while handle.bus.has_session(&SessionId::from_raw("tab-3")) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "channel was not deregistered after disconnect"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    #[test]
    fn build_router_creates_routes() {
        let state = AppState {
            bus: Arc::new(CallbackBus::new(32)),
            config: Arc::new(ServerConfig::default()),
        };
        let _router = build_router(state);
    }
}
