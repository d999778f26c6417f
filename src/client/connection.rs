use crate::types::{RealtimeError, Result, message::OutboundMessage};
use crate::websocket::WsSink;
use futures::SinkExt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct Link {
    state: ConnectionState,
    writer: Option<mpsc::UnboundedSender<Message>>,
}

/// Owns the write side of the transport and the lifecycle state.
///
/// Writes go through an unbounded queue drained by a dedicated writer task,
/// so sending never blocks the caller.
pub struct ConnectionManager {
    link: Mutex<Link>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            link: Mutex::new(Link {
                state: ConnectionState::Disconnected,
                writer: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gets the current connection state
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Sets the connection state
    pub fn set_state(&self, new_state: ConnectionState) {
        self.lock().state = new_state;
    }

    /// Checks if currently connected and the writer is still alive
    pub fn is_connected(&self) -> bool {
        let link = self.lock();
        link.state == ConnectionState::Connected
            && link.writer.as_ref().is_some_and(|w| !w.is_closed())
    }

    /// Takes ownership of a freshly opened sink and marks the link connected
    pub fn attach(&self, sink: WsSink) {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(write_loop(sink, rx));

        let mut link = self.lock();
        link.writer = Some(tx);
        link.state = ConnectionState::Connected;
    }

    /// Queues a message for the writer task
    pub fn send_message(&self, msg: &OutboundMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;

        let link = self.lock();
        let Some(writer) = link.writer.as_ref() else {
            return Err(RealtimeError::NotConnected);
        };
        if link.state != ConnectionState::Connected {
            return Err(RealtimeError::NotConnected);
        }

        writer
            .send(Message::Text(json.into()))
            .map_err(|_| RealtimeError::NotConnected)
    }

    /// Closes the link gracefully: queues a close frame and releases the
    /// writer. Returns the state the link was in.
    pub fn close(&self) -> ConnectionState {
        let mut link = self.lock();
        if let Some(writer) = link.writer.take() {
            let _ = writer.send(Message::Close(None));
        }
        std::mem::replace(&mut link.state, ConnectionState::Disconnected)
    }

    /// Clears the writer after the peer went away. Returns the state the
    /// link was in.
    pub fn clear_writer(&self) -> ConnectionState {
        let mut link = self.lock();
        link.writer = None;
        std::mem::replace(&mut link.state, ConnectionState::Disconnected)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

async fn write_loop(mut sink: WsSink, mut rx: mpsc::UnboundedReceiver<Message>) {
    while let Some(message) = rx.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(e) = sink.send(message).await {
            tracing::debug!("WebSocket write failed: {}", e);
            break;
        }
        if closing {
            break;
        }
    }

    if let Err(e) = sink.close().await {
        tracing::debug!("WebSocket sink close: {}", e);
    }
    tracing::debug!("Write task finished");
}
