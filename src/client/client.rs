use super::{
    ClientState, ConnectionManager, ConnectionState, RealtimeClientBuilder, RealtimeClientOptions,
    StatusNotifier,
};
use crate::infrastructure::{HeartbeatManager, TaskKind};
use crate::messaging::{HandlerRegistry, MessageRouter, MessageType, Subscription};
use crate::types::constants::{DEFAULT_ENDPOINT, env_vars};
use crate::types::message::{GatewayStatus, InboundMessage, LogEntry, OutboundMessage};
use crate::types::Result;
use crate::websocket::{Connector, WsSink};
use futures::stream::StreamExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;

/// The realtime event client for the OpenClaw Manager backend.
///
/// `RealtimeClient` keeps a single WebSocket link to the manager's event
/// endpoint, reconnects with linear backoff after unexpected closes, sends a
/// periodic `ping`, and dispatches inbound events to handlers registered with
/// [`on`](Self::on).
///
/// The client is a cheap handle: clone it into whichever part of the
/// application needs it. Construct one per process at the composition root
/// and call [`disconnect`](Self::disconnect) on shutdown.
///
/// # Example
///
/// ```no_run
/// use openclaw_realtime::{LogEntry, RealtimeClient, RealtimeClientOptions};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RealtimeClient::new("ws://localhost:3000/ws", RealtimeClientOptions::default())?;
///
/// client.on_status_change(|connected| println!("connected: {connected}"));
/// client.on_log(|entry: &LogEntry| println!("[{:?}] {}", entry.level, entry.message));
///
/// client.connect();
/// client.subscribe("logs", None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeClient {
    pub(crate) endpoint: String,
    pub(crate) options: RealtimeClientOptions,
    pub(crate) connector: Arc<dyn Connector>,

    // Connection manager
    pub(crate) connection: Arc<ConnectionManager>,

    // Handler table shared with the router
    pub(crate) handlers: Arc<HandlerRegistry>,

    // Consolidated mutable state
    pub(crate) state: Arc<Mutex<ClientState>>,

    // Serialized status delivery
    pub(crate) status: Arc<StatusNotifier>,
}

impl RealtimeClient {
    /// Creates a new RealtimeClient instance.
    ///
    /// This initializes the client but does not establish a connection. Call
    /// [`connect()`](Self::connect) to open the WebSocket.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a valid `ws://` or `wss://` URL.
    pub fn new(endpoint: impl Into<String>, options: RealtimeClientOptions) -> Result<Self> {
        RealtimeClientBuilder::new(endpoint, options).map(|builder| builder.build())
    }

    /// Creates a client from `OPENCLAW_WS_URL` (default
    /// `ws://localhost:3000/ws`) and the other `OPENCLAW_WS_*` variables.
    pub fn from_env() -> Result<Self> {
        let endpoint =
            std::env::var(env_vars::WS_URL).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        Self::new(endpoint, RealtimeClientOptions::from_env())
    }

    fn lock_state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver recorded status transitions. Must not be called with the
    /// state lock held.
    fn flush_status(&self) {
        self.status.flush(&self.handlers);
    }

    /// Opens the connection.
    ///
    /// Returns immediately; the handshake and all later events happen on
    /// background tasks. Does nothing if the client is already connecting or
    /// connected. A pending automatic reconnect is cancelled and replaced by
    /// this attempt.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn connect(&self) {
        let mut state = self.lock_state();
        if self.connection.state() != ConnectionState::Disconnected {
            tracing::debug!("connect() ignored: already connecting or connected");
            return;
        }

        state.was_manual_disconnect = false;
        state.task_manager.abort(TaskKind::Reconnect);
        self.start_attempt(&mut state);
    }

    fn start_attempt(&self, state: &mut ClientState) {
        let generation = state.next_generation();
        self.connection.set_state(ConnectionState::Connecting);

        let client = self.clone();
        state.task_manager.spawn(TaskKind::Connection, async move {
            client.run_connection(generation).await;
        });
    }

    async fn run_connection(self, generation: u64) {
        tracing::info!("Connecting to {}", self.endpoint);

        let (sink, mut source) = match self.connector.connect(&self.endpoint).await {
            Ok(halves) => halves,
            Err(e) => {
                tracing::warn!("Connection attempt failed: {}", e);
                self.handle_close(generation);
                return;
            }
        };

        if !self.handle_open(generation, sink) {
            return;
        }

        let router = MessageRouter::new(Arc::clone(&self.handlers));
        tracing::info!("Starting read task");
        while let Some(msg_result) = source.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    tracing::debug!("Received text message: {}", text.as_str());
                    router.route_text(&text);
                }
                Ok(Message::Close(frame)) => {
                    if let Some(close_frame) = frame {
                        tracing::warn!(
                            "Server closed connection: code={:?}, reason='{}'",
                            close_frame.code,
                            close_frame.reason.as_str()
                        );
                    } else {
                        tracing::warn!("Server closed connection without close frame");
                    }
                    break;
                }
                Ok(Message::Ping(data)) => {
                    tracing::debug!("Received ping ({} bytes)", data.len());
                }
                Ok(Message::Pong(data)) => {
                    tracing::debug!("Received pong ({} bytes)", data.len());
                }
                Ok(Message::Binary(data)) => {
                    tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
                }
                Ok(Message::Frame(_)) => {
                    tracing::debug!("Received raw frame (internal)");
                }
                Err(e) => {
                    // The stream ends after a fatal error; the close path runs then
                    tracing::error!("WebSocket read error: {}", e);
                }
            }
        }
        tracing::info!("Read task finished");

        self.handle_close(generation);
    }

    /// Installs the new link. Returns `false` if the attempt went stale while
    /// the handshake was in flight.
    fn handle_open(&self, generation: u64, sink: WsSink) -> bool {
        {
            let mut state = self.lock_state();
            if state.generation != generation || state.was_manual_disconnect {
                tracing::debug!("Discarding stale connection (generation {})", generation);
                return false;
            }

            self.connection.attach(sink);
            state.reconnect_timer.reset();

            let interval = self.options.heartbeat_interval();
            if !interval.is_zero() {
                let heartbeat = HeartbeatManager::new(Arc::downgrade(&self.connection))
                    .with_interval(interval);
                state.task_manager.spawn(TaskKind::Heartbeat, heartbeat.run());
            }

            // Queued under the lock so nothing overtakes auth on the wire
            for message in state.open_messages(self.options.auth_token.as_deref()) {
                self.send(message);
            }
            self.status.push(true);
        }

        tracing::info!("Connected to WebSocket server");
        self.flush_status();
        true
    }

    /// Runs after the link of `generation` is gone, or failed to open.
    fn handle_close(&self, generation: u64) {
        {
            let mut state = self.lock_state();
            if state.generation != generation {
                tracing::debug!("Ignoring close of stale connection (generation {})", generation);
                return;
            }

            state.task_manager.abort(TaskKind::Heartbeat);
            state.task_manager.release(TaskKind::Connection);
            self.connection.clear_writer();
            self.status.push(false);
        }

        self.flush_status();
        self.schedule_reconnect(generation);
    }

    fn schedule_reconnect(&self, generation: u64) {
        let mut state = self.lock_state();
        if state.generation != generation || state.was_manual_disconnect {
            return;
        }

        let Some(delay) = state.reconnect_timer.next_delay() else {
            tracing::warn!(
                "Giving up after {} reconnect attempts; call connect() to retry",
                state.reconnect_timer.attempts()
            );
            return;
        };

        tracing::info!(
            "Reconnecting in {:?} (attempt {}/{})",
            delay,
            state.reconnect_timer.attempts(),
            self.options.max_reconnect_attempts()
        );

        let client = self.clone();
        state.task_manager.spawn(TaskKind::Reconnect, async move {
            tokio::time::sleep(delay).await;
            client.try_reconnect(generation);
        });
    }

    fn try_reconnect(&self, generation: u64) {
        let mut state = self.lock_state();
        if state.generation == generation {
            state.task_manager.release(TaskKind::Reconnect);
        }

        if state.was_manual_disconnect {
            tracing::info!("Manual disconnect detected, will not attempt to reconnect");
            return;
        }
        if state.generation != generation
            || self.connection.state() != ConnectionState::Disconnected
        {
            tracing::info!("Already connected or connecting, skipping scheduled reconnect");
            return;
        }

        tracing::info!("Attempting to reconnect...");
        self.start_attempt(&mut state);
    }

    /// Closes the connection and stops all background work.
    ///
    /// Safe to call repeatedly. Cancels the heartbeat, any in-flight
    /// handshake, and any pending reconnect. Status handlers hear `false`
    /// only if the client was connected. Registered handlers and subscribed
    /// channels are kept for the next [`connect()`](Self::connect).
    pub fn disconnect(&self) {
        let previous = {
            let mut state = self.lock_state();
            state.was_manual_disconnect = true;
            state.next_generation();
            state.task_manager.abort_all();
            let previous = self.connection.close();
            if previous == ConnectionState::Connected {
                self.status.push(false);
            }
            previous
        };

        match previous {
            ConnectionState::Disconnected => {
                tracing::debug!("disconnect() called while already disconnected");
            }
            ConnectionState::Connecting => {
                tracing::info!("Cancelled in-flight connection attempt");
            }
            ConnectionState::Connected => {
                tracing::info!("Disconnected from WebSocket server");
                self.flush_status();
            }
        }
    }

    /// Sends a control message if connected; otherwise drops it silently.
    pub fn send(&self, message: OutboundMessage) {
        if let Err(e) = self.connection.send_message(&message) {
            tracing::debug!("Dropping outbound {:?}: {}", message, e);
        }
    }

    /// Subscribes to a server channel.
    ///
    /// The channel is remembered and subscribed again after every reconnect
    /// until [`unsubscribe`](Self::unsubscribe) is called.
    pub fn subscribe(&self, channel: impl Into<String>, params: Option<Map<String, Value>>) {
        let channel = channel.into();
        let mut state = self.lock_state();
        state.remember_channel(&channel, params.clone());
        self.send(OutboundMessage::subscribe(channel, params));
    }

    pub fn unsubscribe(&self, channel: impl Into<String>) {
        let channel = channel.into();
        let mut state = self.lock_state();
        state.forget_channel(&channel);
        self.send(OutboundMessage::unsubscribe(channel));
    }

    /// Registers `handler` for inbound messages tagged `kind`.
    ///
    /// Handlers run on the connection's read task, in registration order, and
    /// should return quickly. The returned [`Subscription`] removes exactly
    /// this registration.
    pub fn on<F>(&self, kind: impl Into<MessageType>, handler: F) -> Subscription
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        self.handlers.add_message_handler(kind.into(), Arc::new(handler))
    }

    /// Registers a handler for `log` events with the payload decoded.
    pub fn on_log<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        self.on(MessageType::Log, move |message: &InboundMessage| {
            match LogEntry::deserialize(&message.data) {
                Ok(entry) => handler(&entry),
                Err(e) => tracing::warn!("Skipping malformed log event id={}: {}", message.id, e),
            }
        })
    }

    /// Registers a handler for `gateway_status` events with the payload decoded.
    pub fn on_gateway_status<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&GatewayStatus) + Send + Sync + 'static,
    {
        self.on(MessageType::GatewayStatus, move |message: &InboundMessage| {
            match GatewayStatus::deserialize(&message.data) {
                Ok(status) => handler(&status),
                Err(e) => tracing::warn!(
                    "Skipping malformed gateway_status event id={}: {}",
                    message.id,
                    e
                ),
            }
        })
    }

    /// Registers `handler(connected)`, called on every open and close.
    pub fn on_status_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.handlers.add_status_handler(Arc::new(handler))
    }

    /// Receiver that mirrors status notifications, for async consumers
    pub fn watch_status(&self) -> watch::Receiver<bool> {
        self.status.subscribe()
    }

    /// Checks whether the link is open right now.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Reconnect attempts made since the last successful open
    pub fn reconnect_attempts(&self) -> u32 {
        self.lock_state().reconnect_timer.attempts()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
