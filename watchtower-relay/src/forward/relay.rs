//! Outbound call to the Watchtower update endpoint.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::delivery::OutboundDelivery;
use crate::Config;

/// Bound on a single outbound call, separate from the forwarding delay.
pub const DOWNSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("WATCHTOWER_API_KEY is not a valid header value")]
    InvalidApiKey(#[source] header::InvalidHeaderValue),

    #[error("failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// How a delivery ended. Only used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Watchtower answered with a 2xx status.
    Delivered(u16),
    /// Watchtower answered with any other status.
    Rejected(u16),
    /// The request never produced a response.
    Failed,
}

/// Sends captured webhooks to Watchtower with bearer authentication.
#[derive(Debug, Clone)]
pub struct Relay {
    client: Client,
    update_url: String,
    authorization: HeaderValue,
}

impl Relay {
    pub fn new(config: &Config) -> Result<Self, RelayError> {
        let client = Client::builder().timeout(DOWNSTREAM_TIMEOUT).build()?;

        let mut authorization =
            HeaderValue::from_str(&format!("Bearer {}", config.watchtower_api_key))
                .map_err(RelayError::InvalidApiKey)?;
        authorization.set_sensitive(true);

        Ok(Self {
            client,
            update_url: config.update_url(),
            authorization,
        })
    }

    pub fn update_url(&self) -> &str {
        &self.update_url
    }

    /// Forwarded headers with auth and content type injected on top.
    pub fn outbound_headers(&self, forwarded: &HeaderMap) -> HeaderMap {
        let mut headers = forwarded.clone();
        headers.insert(header::AUTHORIZATION, self.authorization.clone());
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    /// Perform the POST and log the result. Never retries.
    pub async fn deliver(&self, delivery: &OutboundDelivery) -> DeliveryOutcome {
        let webhook_id = delivery.webhook_id.as_str();

        info!(
            webhook_id = webhook_id,
            url = %self.update_url,
            body_length = delivery.body.len(),
            forwarded_headers = delivery.headers.len(),
            "forward_starting"
        );

        let request = self
            .client
            .post(&self.update_url)
            .headers(self.outbound_headers(&delivery.headers))
            .body(delivery.body.clone());

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_timeout() {
                    error!(
                        webhook_id = webhook_id,
                        url = %self.update_url,
                        timeout_seconds = DOWNSTREAM_TIMEOUT.as_secs(),
                        error = %e,
                        "forward_timeout"
                    );
                } else {
                    error!(
                        webhook_id = webhook_id,
                        url = %self.update_url,
                        error = %e,
                        "forward_request_failed"
                    );
                }
                return DeliveryOutcome::Failed;
            }
        };

        let status = response.status();
        debug!(
            webhook_id = webhook_id,
            status_code = status.as_u16(),
            headers = ?response.headers(),
            "forward_response_received"
        );

        if status == reqwest::StatusCode::NOT_FOUND {
            error!(
                webhook_id = webhook_id,
                url = %self.update_url,
                hint = "check WATCHTOWER_URL; common endpoints are /v1/update, /api/update, /webhook",
                "watchtower_endpoint_not_found"
            );
        }

        match response.bytes().await {
            Ok(body) => debug!(
                webhook_id = webhook_id,
                body = %String::from_utf8_lossy(&body),
                "forward_response_body"
            ),
            Err(e) => error!(
                webhook_id = webhook_id,
                error = %e,
                "forward_response_body_read_failed"
            ),
        }

        if status.is_success() {
            info!(
                webhook_id = webhook_id,
                status_code = status.as_u16(),
                "forward_succeeded"
            );
            DeliveryOutcome::Delivered(status.as_u16())
        } else {
            warn!(
                webhook_id = webhook_id,
                status_code = status.as_u16(),
                "forward_non_success_status"
            );
            DeliveryOutcome::Rejected(status.as_u16())
        }
    }
}
