use crate::types::Result;
use futures::future::BoxFuture;
use futures::{Sink, Stream, StreamExt};
use std::pin::Pin;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Write half of an established transport
pub type WsSink = Pin<Box<dyn Sink<Message, Error = WsError> + Send>>;

/// Read half of an established transport. The stream must end (`None`) once
/// the connection is gone.
pub type WsSource = Pin<Box<dyn Stream<Item = std::result::Result<Message, WsError>> + Send>>;

/// Opens transports for the client.
///
/// The default implementation is [`WebSocketFactory`]; tests and embedders
/// can substitute their own.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<(WsSink, WsSource)>>;
}

/// WebSocket factory for creating tokio-tungstenite connections
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketFactory;

impl WebSocketFactory {
    /// Create a new WebSocket connection
    pub async fn create(url: &str) -> Result<WebSocketStream<MaybeTlsStream<TcpStream>>> {
        tracing::debug!("Creating WebSocket connection to: {}", url);
        let (stream, response) = connect_async(url).await?;
        tracing::debug!("WebSocket handshake completed: {}", response.status());
        Ok(stream)
    }
}

impl Connector for WebSocketFactory {
    fn connect(&self, url: &str) -> BoxFuture<'static, Result<(WsSink, WsSource)>> {
        let url = url.to_string();
        Box::pin(async move {
            let stream = Self::create(&url).await?;
            let (sink, source) = stream.split();
            Ok((Box::pin(sink) as WsSink, Box::pin(source) as WsSource))
        })
    }
}
