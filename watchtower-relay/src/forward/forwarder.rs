//! Delayed, tracked scheduling of outbound deliveries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::info;

use super::delivery::OutboundDelivery;
use super::relay::{DeliveryOutcome, Relay};

/// Schedules each accepted webhook for delivery after a fixed delay.
///
/// Every scheduled delivery runs as its own task on a [`TaskTracker`], so
/// deliveries never block each other and [`Forwarder::drain`] can wait for
/// all of them at shutdown. There is no cancellation and no dedup.
#[derive(Clone)]
pub struct Forwarder {
    relay: Arc<Relay>,
    delay: Duration,
    tracker: TaskTracker,
}

impl Forwarder {
    pub fn new(relay: Relay, delay: Duration) -> Self {
        Self {
            relay: Arc::new(relay),
            delay,
            tracker: TaskTracker::new(),
        }
    }

    /// Queue a delivery. Returns immediately; the delay starts now.
    ///
    /// The webhook handler calls this just before it returns its 201, so the
    /// timer starts a moment before the response is written to the socket.
    /// With delays measured in seconds the response always goes out first.
    pub fn schedule(&self, delivery: OutboundDelivery) -> JoinHandle<DeliveryOutcome> {
        let relay = Arc::clone(&self.relay);
        let delay = self.delay;

        info!(
            webhook_id = %delivery.webhook_id,
            delay_seconds = delay.as_secs_f64(),
            "forward_scheduled"
        );

        self.tracker.spawn(async move {
            tokio::time::sleep(delay).await;
            info!(webhook_id = %delivery.webhook_id, "forward_delay_elapsed");
            relay.deliver(&delivery).await
        })
    }

    /// Number of deliveries still waiting or in flight.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every scheduled delivery to finish.
    pub async fn drain(&self) {
        self.tracker.close();
        info!(pending = self.tracker.len(), "forwarder_draining");
        self.tracker.wait().await;
        info!("forwarder_drained");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use axum::body::Bytes;
    use axum::http::HeaderMap;

    fn relay_to_closed_port() -> Relay {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        Relay::new(&Config {
            webhook_id: "hook".to_string(),
            watchtower_api_key: "key".to_string(),
            watchtower_url: format!("http://{addr}"),
            port: 0,
            watch_only_for_latest_tag: false,
            delay: Duration::ZERO,
            max_body_bytes: 1024,
        })
        .unwrap()
    }

    fn delivery() -> OutboundDelivery {
        OutboundDelivery::capture("hook", &HeaderMap::new(), Bytes::from_static(b"{}"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_waits_for_delay() {
        let forwarder = Forwarder::new(relay_to_closed_port(), Duration::from_secs(20));
        let handle = forwarder.schedule(delivery());

        tokio::time::sleep(Duration::from_secs(19)).await;
        assert!(!handle.is_finished());
        assert_eq!(forwarder.pending(), 1);

        forwarder.drain().await;
        assert_eq!(handle.await.unwrap(), DeliveryOutcome::Failed);
        assert_eq!(forwarder.pending(), 0);
    }

    #[tokio::test]
    async fn test_each_schedule_is_independent() {
        let forwarder = Forwarder::new(relay_to_closed_port(), Duration::ZERO);
        let first = forwarder.schedule(delivery());
        let second = forwarder.schedule(delivery());

        forwarder.drain().await;
        assert_eq!(first.await.unwrap(), DeliveryOutcome::Failed);
        assert_eq!(second.await.unwrap(), DeliveryOutcome::Failed);
    }
}
