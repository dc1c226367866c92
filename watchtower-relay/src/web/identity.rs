//! Webhook identifier verification.
//!
//! The identifier embedded in `/api/webhooks/{id}` is the only credential a
//! registry sends, so it is compared without short-circuiting.

use tracing::warn;

/// Check an inbound path identifier against the configured one.
///
/// Lengths are compared up front; equal-length ids are folded over every
/// byte so the time taken does not reveal the matching prefix.
pub fn verify_webhook_id(expected: &str, provided: &str) -> bool {
    let valid = expected.len() == provided.len()
        && expected
            .bytes()
            .zip(provided.bytes())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0;

    if !valid {
        warn!(
            webhook_id = %provided,
            expected_length = expected.len(),
            actual_length = provided.len(),
            "webhook_id_invalid"
        );
    }

    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_webhook_id() {
        assert!(verify_webhook_id("hook-123", "hook-123"));
        assert!(!verify_webhook_id("hook-123", "hook-124"));
        assert!(!verify_webhook_id("hook-123", "HOOK-123"));
        assert!(!verify_webhook_id("hook-123", "hook-1234"));
        assert!(!verify_webhook_id("hook-123", ""));
    }
}
