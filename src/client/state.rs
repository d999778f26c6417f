use crate::infrastructure::{TaskManager, Timer};
use crate::types::message::OutboundMessage;
use serde_json::{Map, Value};

/// Consolidated mutable state for RealtimeClient
/// Using a single struct keeps the reconnect state machine consistent
pub struct ClientState {
    /// Bumped on every connection attempt and on manual disconnect; tasks
    /// holding an older value are stale
    pub generation: u64,

    /// Linear backoff and attempt counter
    pub reconnect_timer: Timer,

    /// Whether the disconnect was manual (prevents auto-reconnect)
    pub was_manual_disconnect: bool,

    /// Background task manager
    pub task_manager: TaskManager,

    /// Channels to re-subscribe on every open, in subscription order
    pub channels: Vec<(String, Option<Map<String, Value>>)>,
}

impl ClientState {
    pub fn new(reconnect_timer: Timer) -> Self {
        Self {
            generation: 0,
            reconnect_timer,
            was_manual_disconnect: false,
            task_manager: TaskManager::new(),
            channels: Vec::new(),
        }
    }

    /// Start a new connection generation
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Record a channel subscription, replacing params of an existing entry
    pub fn remember_channel(&mut self, channel: &str, params: Option<Map<String, Value>>) {
        match self.channels.iter_mut().find(|(name, _)| name == channel) {
            Some(entry) => entry.1 = params,
            None => self.channels.push((channel.to_string(), params)),
        }
    }

    pub fn forget_channel(&mut self, channel: &str) -> bool {
        let before = self.channels.len();
        self.channels.retain(|(name, _)| name != channel);
        self.channels.len() != before
    }

    /// Messages to send right after a connection opens: `auth` first when a
    /// token is configured, then one `subscribe` per remembered channel
    pub fn open_messages(&self, auth_token: Option<&str>) -> Vec<OutboundMessage> {
        auth_token
            .map(|token| OutboundMessage::auth(Some(token.to_string())))
            .into_iter()
            .chain(self.channels.iter().map(|(channel, params)| {
                OutboundMessage::subscribe(channel.clone(), params.clone())
            }))
            .collect()
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new(Timer::default())
    }
}
