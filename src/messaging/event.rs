use crate::types::constants::inbound_types;
use serde::{Deserialize, Serialize};

/// Type-safe inbound message tags
///
/// Unknown tags are preserved as [`MessageType::Custom`] so handlers can still
/// subscribe to server events this crate does not model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    /// Gateway or agent log line
    Log,

    /// Gateway process status snapshot
    GatewayStatus,

    /// Server-side error report
    Error,

    /// Any other tag
    Custom(String),
}

impl MessageType {
    /// Parse a tag string into a MessageType
    pub fn parse(s: &str) -> Self {
        match s {
            inbound_types::LOG => Self::Log,
            inbound_types::GATEWAY_STATUS => Self::GatewayStatus,
            inbound_types::ERROR => Self::Error,
            _ => Self::Custom(s.to_string()),
        }
    }

    /// Folds a `Custom` holding a known tag into its named variant
    pub fn normalize(self) -> Self {
        match self {
            Self::Custom(s) => Self::from(s),
            known => known,
        }
    }

    /// Convert tag to string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Log => inbound_types::LOG,
            Self::GatewayStatus => inbound_types::GATEWAY_STATUS,
            Self::Error => inbound_types::ERROR,
            Self::Custom(s) => s,
        }
    }
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for MessageType {
    fn from(s: String) -> Self {
        match Self::parse(&s) {
            Self::Custom(_) => Self::Custom(s),
            known => known,
        }
    }
}

impl From<MessageType> for String {
    fn from(kind: MessageType) -> Self {
        match kind {
            MessageType::Custom(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
