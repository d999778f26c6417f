use super::{ClientState, ConnectionManager, RealtimeClient, StatusNotifier};
use crate::infrastructure::Timer;
use crate::messaging::HandlerRegistry;
use crate::types::constants::{
    HEARTBEAT_INTERVAL, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY, env_vars,
};
use crate::types::{RealtimeError, Result};
use crate::websocket::{Connector, WebSocketFactory};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Client configuration. Durations are in milliseconds; `None` means the
/// built-in default.
#[derive(Debug, Clone, Default)]
pub struct RealtimeClientOptions {
    /// Sent in an `auth` message after every successful open
    pub auth_token: Option<String>,
    /// Ping period. `Some(0)` disables the heartbeat
    pub heartbeat_interval: Option<u64>,
    /// Base reconnect delay; attempt `n` waits `n` times this
    pub reconnect_delay: Option<u64>,
    pub max_reconnect_attempts: Option<u32>,
}

impl RealtimeClientOptions {
    /// Reads options from the `OPENCLAW_WS_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads options through `lookup`; unparsable numbers are ignored
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            auth_token: lookup(env_vars::WS_TOKEN).filter(|token| !token.is_empty()),
            heartbeat_interval: parse_var(&lookup, env_vars::HEARTBEAT_MS),
            reconnect_delay: parse_var(&lookup, env_vars::RECONNECT_DELAY_MS),
            max_reconnect_attempts: parse_var(&lookup, env_vars::MAX_RECONNECTS),
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval.unwrap_or(HEARTBEAT_INTERVAL))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay.unwrap_or(RECONNECT_DELAY))
    }

    pub fn max_reconnect_attempts(&self) -> u32 {
        self.max_reconnect_attempts.unwrap_or(MAX_RECONNECT_ATTEMPTS)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid number", key, raw);
            None
        }
    }
}

/// Builder for RealtimeClient that handles validation and wiring
pub struct RealtimeClientBuilder {
    endpoint: String,
    options: RealtimeClientOptions,
    connector: Arc<dyn Connector>,
}

impl RealtimeClientBuilder {
    /// Create a new builder
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::UrlParse`] for a malformed endpoint and
    /// [`RealtimeError::InvalidEndpoint`] when the scheme is not `ws`/`wss`.
    pub fn new(endpoint: impl Into<String>, options: RealtimeClientOptions) -> Result<Self> {
        let endpoint = endpoint.into();

        let url = Url::parse(&endpoint)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(RealtimeError::InvalidEndpoint(format!(
                "expected a ws:// or wss:// URL, got {}",
                endpoint
            )));
        }

        Ok(Self {
            endpoint,
            options,
            connector: Arc::new(WebSocketFactory),
        })
    }

    /// Replace the transport used to open connections
    pub fn with_connector(mut self, connector: impl Connector) -> Self {
        self.connector = Arc::new(connector);
        self
    }

    /// Build the client. Nothing is spawned until `connect()` is called.
    pub fn build(self) -> RealtimeClient {
        let timer = Timer::new(
            self.options.reconnect_delay(),
            self.options.max_reconnect_attempts(),
        );

        RealtimeClient {
            endpoint: self.endpoint,
            options: self.options,
            connector: self.connector,
            connection: Arc::new(ConnectionManager::new()),
            handlers: Arc::new(HandlerRegistry::new()),
            state: Arc::new(Mutex::new(ClientState::new(timer))),
            status: Arc::new(StatusNotifier::new()),
        }
    }
}
