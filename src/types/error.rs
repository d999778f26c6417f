use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that can occur when using the OpenClaw realtime client.
///
/// Runtime conditions (network loss, malformed frames, sends while offline)
/// never reach callers as errors; they are logged and reported through the
/// status handlers instead. These variants cover construction and the
/// transport layer underneath the client.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// WebSocket protocol error (handshake failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Endpoint parsed but is not usable as a WebSocket endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Attempted operation while not connected to the server
    #[error("Not connected")]
    NotConnected,
}

/// Convenience type alias for `Result<T, RealtimeError>`.
pub type Result<T> = std::result::Result<T, RealtimeError>;
