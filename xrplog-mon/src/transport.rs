//! WebSocket transport for the ledger server connection
//!
//! Owns the socket. The read loop forwards every inbound text frame and
//! lifecycle change over an mpsc channel, strictly in receive order; the
//! handle sends opaque command strings upstream. No classification logic
//! lives here.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use xrplog_common::{Error, Result};

/// Events delivered by the transport, in receive order
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Handshake completed
    Opened,
    /// One inbound text frame
    Frame(String),
    /// Connection closed by either side; the read loop terminates after this
    Closed { reason: String },
    /// Socket-level failure; the read loop terminates after this
    Failed { message: String },
}

/// Sending half of the connection
#[derive(Clone)]
pub struct TransportHandle {
    commands: mpsc::Sender<Message>,
}

impl TransportHandle {
    /// Forward one opaque command string to the server.
    ///
    /// The command is not inspected; the caller is responsible for its
    /// content (typically a JSON request captured from user input).
    pub async fn send(&self, command: String) -> Result<()> {
        self.commands
            .send(Message::Text(command))
            .await
            .map_err(|_| Error::Transport("connection is closed".to_string()))
    }

    /// Initiate a clean close handshake
    pub async fn close(&self) -> Result<()> {
        self.commands
            .send(Message::Close(None))
            .await
            .map_err(|_| Error::Transport("connection is closed".to_string()))
    }
}

/// Connect to the ledger server.
///
/// Returns the sending handle and the event channel. `Opened` is always the
/// first event delivered; frames never precede it and nothing follows
/// `Closed` or `Failed`.
pub async fn connect(url: &str) -> Result<(TransportHandle, mpsc::Receiver<TransportEvent>)> {
    let (socket, _response) = connect_async(url)
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;

    let (mut sink, mut stream) = socket.split();
    let (event_tx, event_rx) = mpsc::channel(256);
    let (command_tx, mut command_rx) = mpsc::channel::<Message>(32);

    // Writer: drains outbound commands into the socket
    tokio::spawn(async move {
        while let Some(message) = command_rx.recv().await {
            if let Err(e) = sink.send(message).await {
                warn!("WebSocket send failed: {e}");
                break;
            }
        }
    });

    // Reader: single producer into the event channel, so per-connection
    // ordering of delivered events matches receive order
    tokio::spawn(async move {
        let _ = event_tx.send(TransportEvent::Opened).await;

        while let Some(next) = stream.next().await {
            match next {
                Ok(Message::Text(text)) => {
                    if event_tx.send(TransportEvent::Frame(text)).await.is_err() {
                        // Receiver dropped; nobody is listening anymore
                        break;
                    }
                }
                Ok(Message::Close(frame)) => {
                    let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                    let _ = event_tx.send(TransportEvent::Closed { reason }).await;
                    break;
                }
                // Binary frames carry no ledger payload; ping/pong are
                // handled by the protocol layer
                Ok(_) => {}
                Err(e) => {
                    let _ = event_tx
                        .send(TransportEvent::Failed {
                            message: e.to_string(),
                        })
                        .await;
                    break;
                }
            }
        }

        debug!("WebSocket read loop terminated");
    });

    Ok((
        TransportHandle {
            commands: command_tx,
        },
        event_rx,
    ))
}
