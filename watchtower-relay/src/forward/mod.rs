//! Deferred forwarding of accepted webhooks to Watchtower.
//!
//! ## Flow
//!
//! ```text
//! handler → OutboundDelivery → Forwarder (sleep delay) → Relay → POST /v1/update
//! ```
//!
//! Delivery is fire-and-forget: failures are logged, never retried and never
//! reported back to the original caller.

pub mod delivery;
pub mod forwarder;
pub mod relay;

pub use delivery::OutboundDelivery;
pub use forwarder::Forwarder;
pub use relay::{DeliveryOutcome, Relay, RelayError, DOWNSTREAM_TIMEOUT};
