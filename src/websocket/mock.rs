//! Scriptable in-memory transport used by the client tests.

use super::{Connector, WsSink, WsSource};
use crate::types::{RealtimeError, Result};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

type Inbound = std::result::Result<Message, WsError>;

struct Script {
    outcomes: VecDeque<bool>,
    attempts: Vec<Instant>,
}

/// Accepts or refuses connections according to a script. Once the script is
/// exhausted every further attempt is refused.
#[derive(Clone)]
pub(crate) struct MockConnector {
    script: Arc<Mutex<Script>>,
    servers: mpsc::UnboundedSender<MockServer>,
}

/// Server ends of accepted connections, in accept order
pub(crate) struct MockServers {
    rx: mpsc::UnboundedReceiver<MockServer>,
}

impl MockServers {
    pub(crate) async fn next(&mut self) -> MockServer {
        self.rx.recv().await.expect("connector dropped")
    }

    pub(crate) fn try_next(&mut self) -> Option<MockServer> {
        self.rx.try_recv().ok()
    }
}

impl MockConnector {
    pub(crate) fn new(script: impl IntoIterator<Item = bool>) -> (Self, MockServers) {
        let (servers, rx) = mpsc::unbounded_channel();
        let connector = Self {
            script: Arc::new(Mutex::new(Script {
                outcomes: script.into_iter().collect(),
                attempts: Vec::new(),
            })),
            servers,
        };
        (connector, MockServers { rx })
    }

    /// Instants at which `connect` was called
    pub(crate) fn attempts(&self) -> Vec<Instant> {
        self.script.lock().unwrap().attempts.clone()
    }

    /// Gaps between consecutive attempts, in milliseconds
    pub(crate) fn attempt_gaps_ms(&self) -> Vec<u64> {
        self.attempts()
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_millis() as u64)
            .collect()
    }
}

impl Connector for MockConnector {
    fn connect(&self, _url: &str) -> BoxFuture<'static, Result<(WsSink, WsSource)>> {
        let accept = {
            let mut script = self.script.lock().unwrap();
            script.attempts.push(Instant::now());
            script.outcomes.pop_front().unwrap_or(false)
        };

        if !accept {
            return Box::pin(async {
                Err(RealtimeError::WebSocket(WsError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))))
            });
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<Inbound>();

        let sink = futures::sink::unfold(
            out_tx,
            |tx: mpsc::UnboundedSender<Message>, message: Message| async move {
                tx.send(message).map_err(|_| WsError::ConnectionClosed)?;
                Ok::<_, WsError>(tx)
            },
        );
        let source = futures::stream::unfold(in_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });

        let _ = self.servers.send(MockServer {
            outbound: out_rx,
            inbound: Some(in_tx),
        });

        Box::pin(async move { Ok((Box::pin(sink) as WsSink, Box::pin(source) as WsSource)) })
    }
}

/// Server side of one accepted connection
pub(crate) struct MockServer {
    outbound: mpsc::UnboundedReceiver<Message>,
    inbound: Option<mpsc::UnboundedSender<Inbound>>,
}

impl MockServer {
    pub(crate) fn push_text(&self, text: &str) {
        self.push(Ok(Message::Text(text.into())));
    }

    pub(crate) fn push_error(&self) {
        self.push(Err(WsError::Io(std::io::Error::other("connection reset"))));
    }

    pub(crate) fn push_close(&self) {
        self.push(Ok(Message::Close(None)));
    }

    fn push(&self, item: Inbound) {
        if let Some(tx) = &self.inbound {
            let _ = tx.send(item);
        }
    }

    /// Ends the client's read stream, as if the socket dropped
    pub(crate) fn drop_connection(&mut self) {
        self.inbound = None;
    }

    /// Text frames received so far, parsed as JSON. Close frames are skipped.
    pub(crate) fn received(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(message) = self.outbound.try_recv() {
            if let Message::Text(text) = message {
                frames.push(serde_json::from_str(&text).expect("client sent invalid JSON"));
            }
        }
        frames
    }

    /// `type` tags of the frames received so far
    pub(crate) fn received_types(&mut self) -> Vec<String> {
        self.received()
            .into_iter()
            .filter_map(|frame| frame["type"].as_str().map(str::to_string))
            .collect()
    }
}
