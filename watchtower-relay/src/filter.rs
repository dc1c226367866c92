//! Tag filtering for inbound push notifications.

use thiserror::Error;
use tracing::{debug, info};

use crate::payload::{PayloadError, PushNotification};

/// Tag a push must carry to be forwarded when filtering is enabled.
pub const LATEST_TAG: &str = "latest";

/// Raised when filtering is enabled and the body is not a push notification.
#[derive(Debug, Error)]
#[error("failed to parse push notification: {0}")]
pub struct FilterError(#[from] PayloadError);

/// Outcome of evaluating one inbound webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub forward: bool,
    /// Decoded tag; `None` when filtering is disabled and the body was not parsed.
    pub tag: Option<String>,
}

impl Decision {
    fn unfiltered() -> Self {
        Self {
            forward: true,
            tag: None,
        }
    }
}

/// Decide whether a webhook body should be forwarded.
pub fn evaluate(body: &[u8], watch_only_for_latest_tag: bool) -> Result<Decision, FilterError> {
    if !watch_only_for_latest_tag {
        return Ok(Decision::unfiltered());
    }

    let payload = PushNotification::from_slice(body).map_err(|e| {
        debug!(raw_payload = %String::from_utf8_lossy(body), "push_payload_unparseable");
        FilterError(e)
    })?;

    let tag = payload.tag();
    let forward = tag == LATEST_TAG;

    info!(
        repository = payload.repository_name(),
        tag = tag,
        forward = forward,
        "push_payload_evaluated"
    );

    Ok(Decision {
        forward,
        tag: Some(tag.to_string()),
    })
}
