use crate::client::ConnectionManager;
use crate::types::constants::HEARTBEAT_INTERVAL;
use crate::types::message::OutboundMessage;
use std::sync::Weak;
use std::time::Duration;
use tokio::time::{self, Instant};

const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(HEARTBEAT_INTERVAL);

/// Sends a `ping` control message on a fixed period while connected.
///
/// The first ping goes out one full interval after the task starts. The task
/// exits on its own once the connection manager is dropped; otherwise its
/// owner aborts it.
pub struct HeartbeatManager {
    interval: Duration,
    connection: Weak<ConnectionManager>,
}

impl HeartbeatManager {
    pub fn new(connection: Weak<ConnectionManager>) -> Self {
        Self {
            interval: DEFAULT_HEARTBEAT_INTERVAL,
            connection,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Heartbeat loop; spawn this on the client's task manager
    pub async fn run(self) {
        let mut interval_timer = time::interval_at(Instant::now() + self.interval, self.interval);
        interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            interval_timer.tick().await;

            let Some(connection) = self.connection.upgrade() else {
                // Client dropped, exit heartbeat task
                break;
            };

            match connection.send_message(&OutboundMessage::Ping) {
                Ok(()) => tracing::debug!("Sent heartbeat ping"),
                Err(e) => tracing::debug!("Skipped heartbeat ping: {}", e),
            }
        }
    }
}
