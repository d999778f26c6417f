/// Inbound event tags
pub mod inbound_types {
    pub const LOG: &str = "log";
    pub const GATEWAY_STATUS: &str = "gateway_status";
    pub const ERROR: &str = "error";
}

/// Environment variables read by `RealtimeClient::from_env`
pub mod env_vars {
    pub const WS_URL: &str = "OPENCLAW_WS_URL";
    pub const WS_TOKEN: &str = "OPENCLAW_WS_TOKEN";
    pub const HEARTBEAT_MS: &str = "OPENCLAW_WS_HEARTBEAT_MS";
    pub const RECONNECT_DELAY_MS: &str = "OPENCLAW_WS_RECONNECT_DELAY_MS";
    pub const MAX_RECONNECTS: &str = "OPENCLAW_WS_MAX_RECONNECTS";
}

/// Endpoint used when `OPENCLAW_WS_URL` is unset
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:3000/ws";

/// Default heartbeat interval (milliseconds)
pub const HEARTBEAT_INTERVAL: u64 = 30_000;

/// Base reconnect delay (milliseconds), multiplied by the attempt number
pub const RECONNECT_DELAY: u64 = 1_000;

/// Reconnect attempts before the client gives up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
