//! Watchtower Relay - delayed webhook forwarding for container registries.
//!
//! Receives registry push notifications, optionally filters them on the
//! `latest` tag, answers the registry immediately and forwards the payload to
//! Watchtower's `/v1/update` endpoint after a configurable delay.
//!
//! ## Architecture
//!
//! ```text
//! Registry → web::receive_webhook → filter → 201/200 response
//!                                      ↓
//!                         forward::Forwarder (delay) → forward::Relay → Watchtower
//! ```

pub mod config;
pub mod filter;
pub mod forward;
pub mod payload;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use filter::{evaluate, Decision, FilterError};
pub use forward::{DeliveryOutcome, Forwarder, OutboundDelivery, Relay, RelayError};
pub use payload::{PayloadError, PushNotification};
pub use web::{router, AppState};
