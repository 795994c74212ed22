//! WebSocket Message Types
//!
//! Defines the wire contract between observer clients and the hub:
//! inbound action frames, outbound event envelopes, and control frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved topic for match-creation events observed globally.
pub const GLOBAL_TOPIC: &str = "global";

/// Messages sent from client to hub
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to a topic (a match id, or "global")
    Subscribe { topic: String },
    /// Unsubscribe from a topic
    Unsubscribe { topic: String },
}

/// Event type carried in the outbound envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    #[serde(rename = "match.created")]
    MatchCreated,
    #[serde(rename = "commentary.created")]
    CommentaryCreated,
}

/// Outbound event envelope
///
/// Serialized as `{"type": ..., "topic": ..., "data": ..., "ts": ...}`.
/// The payload is opaque to the hub; it is produced and validated upstream
/// and routed here purely by topic.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub topic: String,
    pub data: Value,
    pub ts: DateTime<Utc>,
}

impl Event {
    /// Build an envelope, stamping `ts` at publish time.
    pub fn new(kind: EventKind, topic: impl Into<String>, data: Value) -> Self {
        Self {
            kind,
            topic: topic.into(),
            data,
            ts: Utc::now(),
        }
    }
}

/// Control frames sent from hub to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Control {
    /// Connection established
    Connected { connection_id: String },
    /// Subscription confirmed
    Subscribed { topic: String },
    /// Unsubscription confirmed
    Unsubscribed { topic: String },
    /// Error frame (malformed input, unknown action, ...)
    Error { message: String },
}

/// Anything the hub pushes down a connection
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Event(Event),
    Control(Control),
}

impl From<Event> for ServerMessage {
    fn from(event: Event) -> Self {
        ServerMessage::Event(event)
    }
}

impl From<Control> for ServerMessage {
    fn from(control: Control) -> Self {
        ServerMessage::Control(control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_deserialize_subscribe() {
        let json = r#"{"action": "subscribe", "topic": "42"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Subscribe { topic } => assert_eq!(topic, "42"),
            _ => panic!("Expected Subscribe"),
        }
    }

    #[test]
    fn test_client_message_deserialize_unsubscribe() {
        let json = r#"{"action": "unsubscribe", "topic": "global"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Unsubscribe { .. }));
    }

    #[test]
    fn test_client_message_unknown_action_rejected() {
        let json = r#"{"action": "frobnicate", "topic": "42"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_client_message_missing_topic_rejected() {
        let json = r#"{"action": "subscribe"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_event_envelope_serialize() {
        let event = Event::new(EventKind::CommentaryCreated, "42", json!({"minute": 10}));
        let json = serde_json::to_string(&ServerMessage::from(event)).unwrap();
        assert!(json.contains("\"type\":\"commentary.created\""));
        assert!(json.contains("\"topic\":\"42\""));
        assert!(json.contains("\"data\":{\"minute\":10}"));
        assert!(json.contains("\"ts\":"));
    }

    #[test]
    fn test_match_created_envelope_targets_global() {
        let event = Event::new(EventKind::MatchCreated, GLOBAL_TOPIC, json!({"id": 7}));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"match.created\""));
        assert!(json.contains("\"topic\":\"global\""));
    }

    #[test]
    fn test_control_serialize_connected() {
        let msg = ServerMessage::from(Control::Connected {
            connection_id: "abc-123".to_string(),
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"connected\""));
        assert!(json.contains("\"connection_id\":\"abc-123\""));
    }

    #[test]
    fn test_control_serialize_error() {
        let msg = ServerMessage::from(Control::Error {
            message: "bad frame".to_string(),
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"error\""));
    }
}
