//! Ingestion coordinator
//!
//! Drains the transport's event channel, classifies each frame off the
//! socket's receive path, persists classified records, and fans results out
//! on the event bus. Frames are handled strictly in receive order, so
//! `created_at` stamps and store insertion order both match the order the
//! server sent them. A classification failure never stops the stream.

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use xrplog_common::classify::classify;
use xrplog_common::db::RecordStore;
use xrplog_common::events::{EventBus, LedgerEvent};

use crate::transport::TransportEvent;

pub struct Coordinator {
    bus: EventBus,
    store: RecordStore,
}

impl Coordinator {
    pub fn new(bus: EventBus, store: RecordStore) -> Self {
        Self { bus, store }
    }

    /// Process transport events until the channel closes
    pub async fn run(self, mut events: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }

        debug!("Transport channel closed, coordinator stopping");
    }

    async fn handle(&self, event: TransportEvent) {
        match event {
            TransportEvent::Frame(text) => self.on_frame(&text).await,

            // Lifecycle events are forwarded verbatim; no classification logic
            TransportEvent::Opened => {
                self.emit(LedgerEvent::ConnectionOpened {
                    timestamp: Utc::now(),
                });
            }
            TransportEvent::Closed { reason } => {
                self.emit(LedgerEvent::ConnectionClosed {
                    reason,
                    timestamp: Utc::now(),
                });
            }
            TransportEvent::Failed { message } => {
                self.emit(LedgerEvent::ConnectionError {
                    message,
                    timestamp: Utc::now(),
                });
            }
        }
    }

    /// Classify one frame and publish exactly one record or error event.
    /// Each frame is independent; there is no per-frame retry.
    async fn on_frame(&self, text: &str) {
        match classify(text) {
            Ok(record) => {
                self.emit(LedgerEvent::RecordClassified {
                    record: record.clone(),
                    timestamp: Utc::now(),
                });

                match self.store.append(&record).await {
                    Ok(id) => self.emit(LedgerEvent::RecordPersisted {
                        id,
                        timestamp: Utc::now(),
                    }),
                    // A store fault loses durability for this record only;
                    // the stream continues
                    Err(e) => error!("Failed to persist record: {e}"),
                }
            }
            Err(e) => {
                warn!("Classification failed: {e}");
                self.emit(LedgerEvent::ClassificationFailed {
                    error: e,
                    timestamp: Utc::now(),
                });
            }
        }
    }

    fn emit(&self, event: LedgerEvent) {
        // No subscribers is normal during startup and shutdown
        let _ = self.bus.emit(event);
    }
}
