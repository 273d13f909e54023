//! Change notification for chain growth.
//!
//! The header store publishes one [`ChainEvent`](crate::types::ChainEvent)
//! per successful batch write. Delivery is in publish order and at most once
//! per subscriber; late subscribers see only events published after they
//! subscribed, and nothing survives a restart.

use thiserror::Error;
use tokio::sync::broadcast;

const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Event-related errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Bus receiver failed: {0}")]
    ReceiveFailure(String),
}

type Result<T> = std::result::Result<T, Error>;

/// Broadcast channel fan-out for store change events.
///
/// Every subscriber receives every event published after it subscribed.
/// Publishing never blocks; a subscriber that falls more than the channel
/// capacity behind observes a lag error instead of stalling the writer.
#[derive(Debug, Clone)]
pub struct EventBus<T: Clone> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventBus<T> {
    /// Create a bus buffering up to `capacity` undelivered events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
        }
    }

    /// Register a new subscriber. Dropping the returned receiver
    /// unsubscribes it.
    pub fn subscribe(&self) -> EventReceiver<T> {
        EventReceiver::new(self.sender.subscribe())
    }

    /// Publish one event to all current subscribers.
    ///
    /// Having no subscribers is not an error; the event is simply dropped.
    pub fn emit(&self, event: T) {
        let _ = self.sender.send(event);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> Default for EventBus<T> {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Receiving half of an [`EventBus`] subscription.
#[derive(Debug)]
pub struct EventReceiver<T: Clone> {
    receiver: broadcast::Receiver<T>,
}

impl<T: Clone> EventReceiver<T> {
    fn new(receiver: broadcast::Receiver<T>) -> Self {
        Self {
            receiver,
        }
    }

    /// Wait for the next event.
    pub async fn recv(&mut self) -> Result<T> {
        match self.receiver.recv().await {
            Ok(event) => Ok(event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                Err(Error::ReceiveFailure(format!("lagged {} events", n)))
            }
            Err(broadcast::error::RecvError::Closed) => {
                Err(Error::ReceiveFailure("event bus closed".to_string()))
            }
        }
    }

    /// Return the next pending event without waiting, or `None` when no
    /// event is queued.
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}
