//! Subscriber handles registered with the hub

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors writing to a subscriber
#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("Subscriber connection closed")]
    Closed,

    #[error("Write to subscriber failed: {0}")]
    Write(String),
}

/// A live connection that receives serialized events
///
/// One `send` call carries exactly one serialized event. Any error makes the
/// hub close and drop the subscriber.
#[async_trait]
pub trait Subscriber: Send + Sync {
    async fn send(&self, payload: Arc<str>) -> Result<(), SubscriberError>;

    /// Called once when the hub drops this subscriber after a failed write
    async fn close(&self) {}
}

/// Subscriber that forwards payloads into a bounded channel
///
/// This is the adapter for real transports: the transport task owns the
/// receiver and writes each payload as one message. Dropping the receiver
/// makes the next send fail.
#[derive(Debug)]
pub struct ChannelSubscriber {
    tx: mpsc::Sender<Arc<str>>,
}

impl ChannelSubscriber {
    /// Creates a subscriber and the receiver its payloads arrive on
    pub fn channel(capacity: usize) -> (Arc<Self>, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl Subscriber for ChannelSubscriber {
    async fn send(&self, payload: Arc<str>) -> Result<(), SubscriberError> {
        self.tx
            .send(payload)
            .await
            .map_err(|_| SubscriberError::Closed)
    }
}
