//! Shared utilities for integration testing.

use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use watchtower_relay::{router, AppState, Config, Forwarder, Relay};

pub const WEBHOOK_ID: &str = "test-hook";
pub const API_KEY: &str = "test-key";

/// One request seen by the mock Watchtower.
#[derive(Debug)]
pub struct Captured {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub received_at: Instant,
}

#[derive(Clone)]
struct DownstreamState {
    status: StatusCode,
    tx: mpsc::UnboundedSender<Captured>,
}

async fn capture(
    State(state): State<DownstreamState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let _ = state.tx.send(Captured {
        path: uri.path().to_string(),
        headers,
        body,
        received_at: Instant::now(),
    });
    (state.status, r#"{"ok":true}"#)
}

/// Start a mock Watchtower that records every request and answers `status`.
pub async fn start_downstream(status: StatusCode) -> (String, mpsc::UnboundedReceiver<Captured>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = Router::new()
        .fallback(capture)
        .with_state(DownstreamState { status, tx });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), rx)
}

pub fn config(watchtower_url: &str, watch_only_for_latest_tag: bool, delay: Duration) -> Config {
    Config {
        webhook_id: WEBHOOK_ID.to_string(),
        watchtower_api_key: API_KEY.to_string(),
        watchtower_url: watchtower_url.to_string(),
        port: 0,
        watch_only_for_latest_tag,
        delay,
        max_body_bytes: 64 * 1024,
    }
}

/// Start the relay on an ephemeral port. Returns its base URL and forwarder.
pub async fn start_relay(config: Config) -> (String, Forwarder) {
    let relay = Relay::new(&config).unwrap();
    let forwarder = Forwarder::new(relay, config.delay);
    let app = router(AppState::new(config, forwarder.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), forwarder)
}

pub fn webhook_url(relay: &str, id: &str) -> String {
    format!("{relay}/api/webhooks/{id}")
}
