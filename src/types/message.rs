use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::Result;
use crate::MessageType;

/// Control message sent from the dashboard to the manager backend.
///
/// Serialized as a JSON object tagged by `type`, e.g. `{"type":"ping"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Auth {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },
    Subscribe {
        channel: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Map<String, Value>>,
    },
    Unsubscribe {
        channel: String,
    },
    Ping,
}

impl OutboundMessage {
    pub fn auth(token: Option<String>) -> Self {
        Self::Auth { token }
    }

    pub fn subscribe(channel: impl Into<String>, data: Option<Map<String, Value>>) -> Self {
        Self::Subscribe {
            channel: channel.into(),
            data,
        }
    }

    pub fn unsubscribe(channel: impl Into<String>) -> Self {
        Self::Unsubscribe {
            channel: channel.into(),
        }
    }
}

/// Event envelope pushed by the server.
///
/// The `type` tag is kept open: tags this crate does not know about still
/// parse, and are only delivered to handlers registered for that exact tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub timestamp: String,
}

impl InboundMessage {
    pub fn new(kind: impl Into<MessageType>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            id: String::new(),
            data,
            timestamp: String::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Decodes `data` according to the message tag.
    pub fn payload(&self) -> Result<InboundPayload> {
        let payload = match &self.kind {
            MessageType::Log => InboundPayload::Log(serde_json::from_value(self.data.clone())?),
            MessageType::GatewayStatus => {
                InboundPayload::GatewayStatus(serde_json::from_value(self.data.clone())?)
            }
            MessageType::Error => InboundPayload::Error(serde_json::from_value(self.data.clone())?),
            MessageType::Custom(_) => InboundPayload::Other(self.data.clone()),
        };
        Ok(payload)
    }
}

/// Typed view of an inbound message's `data`
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload {
    Log(LogEntry),
    GatewayStatus(GatewayStatus),
    Error(ServerError),
    Other(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Which part of the gateway produced a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogComponent {
    Gateway,
    Agents,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub component: LogComponent,
    pub timestamp: String,
}

/// Snapshot of the gateway process as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const LOG_FRAME: &str = r#"{"type":"log","id":"1","data":{"level":"info","message":"hi","component":"gateway","timestamp":"2024-01-01T00:00:00Z"},"timestamp":"2024-01-01T00:00:00Z"}"#;

    #[test]
    fn test_outbound_wire_format() {
        assert_eq!(
            serde_json::to_value(OutboundMessage::Ping).unwrap(),
            json!({"type": "ping"})
        );
        assert_eq!(
            serde_json::to_value(OutboundMessage::auth(None)).unwrap(),
            json!({"type": "auth"})
        );
        assert_eq!(
            serde_json::to_value(OutboundMessage::auth(Some("secret".into()))).unwrap(),
            json!({"type": "auth", "token": "secret"})
        );
        assert_eq!(
            serde_json::to_value(OutboundMessage::unsubscribe("logs")).unwrap(),
            json!({"type": "unsubscribe", "channel": "logs"})
        );
    }

    #[test]
    fn test_subscribe_omits_missing_params() {
        let bare = serde_json::to_string(&OutboundMessage::subscribe("logs", None)).unwrap();
        assert!(!bare.contains(r#""data""#));

        let mut params = Map::new();
        params.insert("component".to_string(), json!("agents"));
        let with_params =
            serde_json::to_value(OutboundMessage::subscribe("logs", Some(params))).unwrap();
        assert_eq!(
            with_params,
            json!({"type": "subscribe", "channel": "logs", "data": {"component": "agents"}})
        );
    }

    #[test]
    fn test_parse_log_frame() {
        let message: InboundMessage = serde_json::from_str(LOG_FRAME).unwrap();
        assert_eq!(message.kind, MessageType::Log);
        assert_eq!(message.id, "1");
        assert_eq!(message.timestamp, "2024-01-01T00:00:00Z");

        let InboundPayload::Log(entry) = message.payload().unwrap() else {
            panic!("expected a log payload");
        };
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.component, LogComponent::Gateway);
        assert_eq!(entry.message, "hi");
    }

    #[test]
    fn test_parse_gateway_status_with_optional_fields() {
        let message: InboundMessage = serde_json::from_value(json!({
            "type": "gateway_status",
            "id": "7",
            "data": {"status": "running", "pid": 4242, "cpu": 12.5, "memory": {"rss": 1024}},
            "timestamp": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        let InboundPayload::GatewayStatus(status) = message.payload().unwrap() else {
            panic!("expected a gateway status payload");
        };
        assert_eq!(status.status, "running");
        assert_eq!(status.pid, Some(4242));
        assert_eq!(status.uptime, None);
        assert_eq!(status.cpu, Some(12.5));
        assert_eq!(status.memory, Some(json!({"rss": 1024})));
    }

    #[test]
    fn test_unknown_type_is_kept_as_custom() {
        let message: InboundMessage =
            serde_json::from_str(r#"{"type":"agent_update","data":{"name":"a"}}"#).unwrap();
        assert_eq!(message.kind, MessageType::Custom("agent_update".to_string()));
        assert_eq!(message.id, "");
        assert_eq!(
            message.payload().unwrap(),
            InboundPayload::Other(json!({"name": "a"}))
        );
    }

    #[test]
    fn test_mismatched_payload_is_an_error() {
        let message = InboundMessage::new(MessageType::Error, json!({"code": 5}));
        assert!(message.payload().is_err());
    }

    #[test]
    fn test_missing_type_fails_to_parse() {
        assert!(serde_json::from_str::<InboundMessage>(r#"{"id":"1","data":{}}"#).is_err());
        assert!(serde_json::from_str::<InboundMessage>("not json").is_err());
    }
}
