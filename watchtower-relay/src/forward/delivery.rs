//! A single captured webhook awaiting delivery.

use axum::body::Bytes;
use axum::http::{header, HeaderMap};

/// Everything captured from an inbound request that the relay needs later.
#[derive(Debug, Clone)]
pub struct OutboundDelivery {
    pub webhook_id: String,
    /// Inbound headers minus `Authorization` and transport-managed headers.
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OutboundDelivery {
    /// Capture an inbound request for forwarding.
    ///
    /// `Authorization` is dropped so the caller's credentials never reach
    /// Watchtower. `Host`, `Content-Length`, `Transfer-Encoding` and
    /// `Connection` describe the inbound connection and are recomputed by the
    /// outbound client.
    pub fn capture(webhook_id: impl Into<String>, inbound: &HeaderMap, body: Bytes) -> Self {
        let mut headers = HeaderMap::with_capacity(inbound.len());
        for (name, value) in inbound {
            if is_forwardable(name) {
                headers.append(name.clone(), value.clone());
            }
        }

        Self {
            webhook_id: webhook_id.into(),
            headers,
            body,
        }
    }
}

const DROPPED_HEADERS: [header::HeaderName; 5] = [
    header::AUTHORIZATION,
    header::HOST,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
];

fn is_forwardable(name: &header::HeaderName) -> bool {
    // HeaderName is always lowercase, so this comparison is case-insensitive.
    !DROPPED_HEADERS.contains(name)
}
