// WebSocket module - Transport seam and the tokio-tungstenite connector
pub mod factory;

#[cfg(test)]
pub(crate) mod mock;

pub use factory::{Connector, WebSocketFactory, WsSink, WsSource};
