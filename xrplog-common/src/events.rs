//! Event types and distribution bus for XRPLog
//!
//! Every classification outcome and connection lifecycle change is published
//! as a [`LedgerEvent`] on the [`EventBus`], which wraps `tokio::broadcast`:
//! publishing never blocks, slow subscribers lag instead of stalling the
//! ingestion path, and receivers may subscribe or drop while a publish is in
//! flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::classify::ClassifyError;
use crate::records::LedgerRecord;

/// XRPLog event types
///
/// Classification errors are a distinct variant, never mixed into the record
/// stream; connection events are forwarded verbatim from the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    /// A frame was classified successfully
    RecordClassified {
        record: LedgerRecord,
        timestamp: DateTime<Utc>,
    },

    /// A classified record reached the log store
    RecordPersisted {
        /// Store-assigned row id
        id: i64,
        timestamp: DateTime<Utc>,
    },

    /// A frame failed classification; the stream continues
    ClassificationFailed {
        error: ClassifyError,
        timestamp: DateTime<Utc>,
    },

    /// WebSocket connection established
    ConnectionOpened {
        timestamp: DateTime<Utc>,
    },

    /// WebSocket connection closed by either side
    ConnectionClosed {
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Transport-level failure
    ConnectionError {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

/// Central event distribution bus
///
/// Wraps `tokio::broadcast`, providing:
/// - Non-blocking publish (slow subscribers don't block the publisher)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// Per-subscriber delivery order always matches emit order.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LedgerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    ///
    /// `capacity` is the number of events buffered per subscriber before the
    /// oldest are dropped and the subscriber observes a lag.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all current subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` otherwise. Having no subscribers is normal during startup and
    /// shutdown; callers decide whether that is worth logging.
    pub fn emit(
        &self,
        event: LedgerEvent,
    ) -> Result<usize, broadcast::error::SendError<LedgerEvent>> {
        self.tx.send(event)
    }

    /// Number of currently attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened() -> LedgerEvent {
        LedgerEvent::ConnectionOpened {
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new(100);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn test_emit_without_subscribers_is_error_not_panic() {
        let bus = EventBus::new(100);
        assert!(bus.emit(opened()).is_err());
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_emit_order() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        bus.emit(LedgerEvent::ConnectionOpened {
            timestamp: Utc::now(),
        })
        .unwrap();
        bus.emit(LedgerEvent::ConnectionClosed {
            reason: "done".to_string(),
            timestamp: Utc::now(),
        })
        .unwrap();

        assert!(matches!(
            rx.recv().await.unwrap(),
            LedgerEvent::ConnectionOpened { .. }
        ));
        assert!(matches!(
            rx.recv().await.unwrap(),
            LedgerEvent::ConnectionClosed { .. }
        ));
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(100);
        let _early = bus.subscribe();

        bus.emit(opened()).unwrap();

        let mut late = bus.subscribe();
        bus.emit(LedgerEvent::ConnectionClosed {
            reason: "done".to_string(),
            timestamp: Utc::now(),
        })
        .unwrap();

        // The late subscriber only sees the event emitted after it joined.
        assert!(matches!(
            late.recv().await.unwrap(),
            LedgerEvent::ConnectionClosed { .. }
        ));
        assert!(late.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_during_publish_is_safe() {
        let bus = EventBus::new(100);
        let rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(opened()).unwrap();
        drop(rx1);
        bus.emit(LedgerEvent::ConnectionClosed {
            reason: String::new(),
            timestamp: Utc::now(),
        })
        .unwrap();

        // The remaining subscriber still sees both events, in order.
        assert!(matches!(
            rx2.recv().await.unwrap(),
            LedgerEvent::ConnectionOpened { .. }
        ));
        assert!(matches!(
            rx2.recv().await.unwrap(),
            LedgerEvent::ConnectionClosed { .. }
        ));
        assert_eq!(bus.subscriber_count(), 1);
    }
}
