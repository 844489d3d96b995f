//! Subscribable event stream
//!
//! The registry and the engine publish [`EngineEvent`]s to a shared
//! [`EventBus`]. Consumers subscribe to everything or to the events touching a
//! single account.
//!
//! # Delivery
//!
//! The bus is a `tokio::sync::broadcast` channel. Publishing never blocks and
//! never fails the operation that produced the event: with no subscribers the
//! event is dropped, and a subscriber that falls more than the channel capacity
//! behind skips the oldest events (logged at `warn`).

use crate::types::{AccountId, EngineEvent};
use futures::Stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Default number of events buffered per subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Broadcast publisher shared by registry and engine
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Create a bus that buffers up to `capacity` events per subscriber
    ///
    /// A zero capacity falls back to [`DEFAULT_EVENT_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            tracing::warn!(
                capacity,
                default = DEFAULT_EVENT_CAPACITY,
                "Invalid event capacity, using default"
            );
            DEFAULT_EVENT_CAPACITY
        } else {
            capacity
        };
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers
    pub fn publish(&self, event: EngineEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Event published with no subscribers");
        }
    }

    /// Subscribe to every event published from now on
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            account: None,
        }
    }

    /// Subscribe to events involving `account`
    pub fn subscribe_account(&self, account: AccountId) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            account: Some(account),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// A consumer's view of the event stream
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<EngineEvent>,
    account: Option<AccountId>,
}

impl Subscription {
    fn accepts(&self, event: &EngineEvent) -> bool {
        self.account
            .as_ref()
            .map_or(true, |account| event.involves(account))
    }

    /// Next buffered event, without waiting
    ///
    /// Returns `None` when nothing matching is buffered.
    pub fn try_next(&mut self) -> Option<EngineEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain every buffered matching event
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }

    /// Wait for the next matching event
    ///
    /// Returns `None` once every publisher has been dropped.
    pub async fn next(&mut self) -> Option<EngineEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Convert into a `futures::Stream` of matching events
    pub fn into_stream(self) -> impl Stream<Item = EngineEvent> {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|event| (event, subscription))
        })
    }
}
