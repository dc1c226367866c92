//! Web server module for inbound registry webhooks.
//!
//! The handlers only:
//! - Verify the webhook identifier
//! - Optionally filter on the pushed tag
//! - Hand accepted payloads to the [`Forwarder`](crate::forward::Forwarder)
//! - Respond immediately
//!
//! Forwarding to Watchtower happens later, outside the request lifecycle.

pub mod handlers;
pub mod identity;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, receive_webhook, AcceptedResponse, AppState, SkippedResponse};
pub use identity::verify_webhook_id;

/// Build the relay router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/webhooks/:id", post(receive_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
