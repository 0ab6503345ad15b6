//! Broadcast hub for live status updates
//!
//! The hub owns a registry of subscribers and fans every event out to all of
//! them. Register, unregister and broadcast are serialized through one async
//! mutex, held for the whole broadcast. A slow subscriber therefore delays
//! delivery to the others in that call. There is no history: a subscriber
//! only sees events broadcast after it registered.

mod event;
mod subscriber;

pub use event::{CreatedEvent, EventStatus, StatusEvent, TerminalEvent, TransitionEvent};
pub use subscriber::{ChannelSubscriber, Subscriber, SubscriberError};

use std::sync::Arc;
use tokio::sync::Mutex;

/// Subscriber registry plus fan-out publisher
#[derive(Default)]
pub struct Hub {
    subscribers: Mutex<Vec<Arc<dyn Subscriber>>>,
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub").finish_non_exhaustive()
    }
}

/// Handle identity is pointer identity of the shared allocation
fn same_handle(a: &Arc<dyn Subscriber>, b: &Arc<dyn Subscriber>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber; registering the same handle twice is a no-op
    ///
    /// Returns true if the subscriber was newly added.
    pub async fn register(&self, subscriber: Arc<dyn Subscriber>) -> bool {
        let mut subscribers = self.subscribers.lock().await;
        if subscribers.iter().any(|s| same_handle(s, &subscriber)) {
            return false;
        }
        subscribers.push(subscriber);
        tracing::debug!("Subscriber registered ({} live)", subscribers.len());
        true
    }

    /// Removes a subscriber without closing it
    ///
    /// Returns true if the subscriber was registered.
    pub async fn unregister(&self, subscriber: &Arc<dyn Subscriber>) -> bool {
        let mut subscribers = self.subscribers.lock().await;
        let before = subscribers.len();
        subscribers.retain(|s| !same_handle(s, subscriber));
        before != subscribers.len()
    }

    /// Number of registered subscribers
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Serializes an event once and writes it to every subscriber
    ///
    /// Subscribers whose write fails are closed and removed during this call.
    /// Failures are never reported to the caller.
    ///
    /// # Returns
    ///
    /// The number of subscribers that received the event
    pub async fn broadcast(&self, event: &StatusEvent) -> usize {
        let payload: Arc<str> = match serde_json::to_string(event) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                tracing::warn!("Skipping broadcast for {}: {}", event.id(), e);
                return 0;
            }
        };

        self.broadcast_payload(payload).await
    }

    /// Writes an already serialized payload to every subscriber
    pub async fn broadcast_payload(&self, payload: Arc<str>) -> usize {
        let mut subscribers = self.subscribers.lock().await;

        let mut delivered = 0;
        let mut failed = Vec::new();

        for (index, subscriber) in subscribers.iter().enumerate() {
            match subscriber.send(Arc::clone(&payload)).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!("Dropping subscriber after failed write: {}", e);
                    failed.push(index);
                }
            }
        }

        // Highest index first so earlier indices stay valid
        for index in failed.into_iter().rev() {
            let subscriber = subscribers.remove(index);
            subscriber.close().await;
        }

        delivered
    }
}
