//! # OpenClaw Realtime
//!
//! Realtime event client for the OpenClaw Manager dashboard. Keeps one
//! WebSocket connection to the manager backend, reconnects with linear
//! backoff, keeps the link alive with a periodic `ping`, and fans inbound
//! events (`log`, `gateway_status`, `error`, ...) out to registered handlers.
//!
//! ## Example
//!
//! ```no_run
//! use openclaw_realtime::{InboundMessage, RealtimeClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RealtimeClient::from_env()?;
//!
//!     let _status = client.on_status_change(|connected| {
//!         println!("connected: {connected}");
//!     });
//!     let _logs = client.on("log", |message: &InboundMessage| {
//!         println!("{}", message.data);
//!     });
//!
//!     client.connect();
//!     client.subscribe("logs", None);
//!
//!     tokio::signal::ctrl_c().await?;
//!     client.disconnect();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod types;
pub mod websocket;

pub use client::{ConnectionState, RealtimeClient, RealtimeClientBuilder, RealtimeClientOptions};
pub use messaging::{MessageType, Subscription};
pub use types::{
    GatewayStatus, InboundMessage, InboundPayload, LogComponent, LogEntry, LogLevel,
    OutboundMessage, RealtimeError, Result, ServerError,
};
pub use websocket::Connector;
