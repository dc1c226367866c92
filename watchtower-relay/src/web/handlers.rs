//! Webhook endpoint handlers.
//!
//! These handlers never wait on Watchtower. They decide the response from the
//! request alone and leave delivery to the background forwarder.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::filter::evaluate;
use crate::forward::{Forwarder, OutboundDelivery};
use crate::web::identity::verify_webhook_id;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub forwarder: Forwarder,
}

impl AppState {
    pub fn new(config: Config, forwarder: Forwarder) -> Self {
        Self {
            config: Arc::new(config),
            forwarder,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Registry Webhook
// =============================================================================

/// Body returned when a webhook is queued for forwarding.
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub message: &'static str,
    pub webhook_id: String,
}

/// Body returned when a webhook is filtered out by tag.
#[derive(Debug, Serialize)]
pub struct SkippedResponse {
    pub message: &'static str,
    pub tag: String,
}

pub const ACCEPTED_MESSAGE: &str = "Webhook received and queued for processing";
pub const SKIPPED_MESSAGE: &str = "Webhook received but not forwarded - tag is not latest";

/// Registry webhook endpoint.
///
/// This endpoint:
/// 1. Rejects unknown identifiers with 401
/// 2. Buffers the body once, 400 on read failure
/// 3. Applies the optional `latest` tag filter (200 when skipped)
/// 4. Schedules a deferred forward and returns 201
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    if !verify_webhook_id(&state.config.webhook_id, &id) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }
    debug!(webhook_id = %id, "webhook_id_validated");

    let body = match to_bytes(body, state.config.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(webhook_id = %id, error = %e, "webhook_body_read_failed");
            return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
        }
    };

    info!(
        webhook_id = %id,
        body_length = body.len(),
        filter_latest = state.config.watch_only_for_latest_tag,
        "webhook_received"
    );

    let decision = match evaluate(&body, state.config.watch_only_for_latest_tag) {
        Ok(decision) => decision,
        Err(e) => {
            error!(webhook_id = %id, error = %e, "webhook_payload_invalid");
            return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
        }
    };

    if !decision.forward {
        let tag = decision.tag.unwrap_or_default();
        info!(webhook_id = %id, tag = %tag, "webhook_skipped_not_latest");
        return (
            StatusCode::OK,
            Json(SkippedResponse {
                message: SKIPPED_MESSAGE,
                tag,
            }),
        )
            .into_response();
    }

    state
        .forwarder
        .schedule(OutboundDelivery::capture(id.clone(), &headers, body));

    (
        StatusCode::CREATED,
        Json(AcceptedResponse {
            message: ACCEPTED_MESSAGE,
            webhook_id: id,
        }),
    )
        .into_response()
}
