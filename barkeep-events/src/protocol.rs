//! Wire frames for the realtime events WebSocket protocol
//!
//! All frames are JSON text frames tagged by a `type` field. Domain events
//! arrive wrapped in `data` frames whose `event` payload may itself be a
//! JSON string (double-encoded) or an already-parsed object.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use barkeep_core::OrderEvent;

use crate::auth::Authorization;

/// Frames this client sends
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Sent immediately after the socket opens
    ConnectionInit,
    /// Binds the connection to a channel, with fresh authorization
    Subscribe {
        id: String,
        channel: String,
        authorization: Authorization,
    },
}

/// Frames the server sends
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Connection accepted; subscribing may begin
    ConnectionAck,
    /// Subscription confirmed; events may now be dispatched
    SubscribeSuccess {
        #[serde(default)]
        id: Option<String>,
    },
    /// A published domain event
    Data { event: Value },
    Error {
        #[serde(default)]
        errors: Vec<FrameError>,
    },
    ConnectionError {
        #[serde(default)]
        errors: Vec<FrameError>,
    },
    /// Keep-alive; ignored
    Ka,
}

/// Error detail inside `error`/`connection_error` frames
#[derive(Debug, Clone, Deserialize)]
pub struct FrameError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "errorType")]
    pub error_type: Option<String>,
}

/// One-line description of a server error frame
pub fn summarize(errors: &[FrameError]) -> String {
    errors
        .iter()
        .find_map(|e| e.message.clone().or_else(|| e.error_type.clone()))
        .unwrap_or_else(|| "WebSocket error".to_string())
}

/// Decode the event payload of a `data` frame
///
/// The payload is tolerated in both of its observed forms: a JSON string
/// holding the encoded event, or the event object itself.
pub fn decode_event(event: &Value) -> Result<OrderEvent, serde_json::Error> {
    match event {
        Value::String(raw) => serde_json::from_str(raw),
        other => serde_json::from_value(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn connection_init_serializes_bare() {
        let json = serde_json::to_string(&ClientFrame::ConnectionInit).unwrap();
        assert_eq!(json, r#"{"type":"connection_init"}"#);
    }

    #[test]
    fn subscribe_frame_carries_channel_and_authorization() {
        let frame = ClientFrame::Subscribe {
            id: "sub-1".to_string(),
            channel: "/orders/admin".to_string(),
            authorization: Authorization {
                host: "api.example.com".to_string(),
                api_key: "key-1".to_string(),
            },
        };

        let value: Value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "subscribe");
        assert_eq!(value["id"], "sub-1");
        assert_eq!(value["channel"], "/orders/admin");
        assert_eq!(value["authorization"]["host"], "api.example.com");
        assert_eq!(value["authorization"]["x-api-key"], "key-1");
    }

    #[test]
    fn parses_control_frames() {
        assert!(matches!(
            serde_json::from_str::<ServerFrame>(r#"{"type":"connection_ack","connectionTimeoutMs":300000}"#).unwrap(),
            ServerFrame::ConnectionAck
        ));
        assert!(matches!(
            serde_json::from_str::<ServerFrame>(r#"{"type":"subscribe_success","id":"sub-1"}"#).unwrap(),
            ServerFrame::SubscribeSuccess { .. }
        ));
        assert!(matches!(
            serde_json::from_str::<ServerFrame>(r#"{"type":"ka"}"#).unwrap(),
            ServerFrame::Ka
        ));
    }

    #[test]
    fn unknown_frame_type_is_an_error() {
        assert!(serde_json::from_str::<ServerFrame>(r#"{"type":"last_call"}"#).is_err());
    }

    #[test]
    fn decodes_object_event() {
        let event = json!({
            "type": "ORDER_CREATED",
            "data": {
                "id": "o1",
                "drink": {"id": "d1", "name": "Negroni", "image_url": ""},
                "user_session_id": "s1",
                "status": "pending",
                "created_at": "2026-01-15T18:00:00Z",
                "updated_at": "2026-01-15T18:00:00Z"
            }
        });

        let decoded = decode_event(&event).unwrap();
        assert_eq!(decoded.order().id, "o1");
    }

    #[test]
    fn decodes_double_encoded_event() {
        let inner = json!({
            "type": "ORDER_COMPLETED",
            "data": {
                "id": "o2",
                "drink": {"id": "d1", "name": "Negroni", "image_url": ""},
                "user_session_id": "s1",
                "status": "completed",
                "created_at": "2026-01-15T18:00:00Z",
                "updated_at": "2026-01-15T18:10:00Z"
            }
        });
        let event = Value::String(inner.to_string());

        let decoded = decode_event(&event).unwrap();
        assert_eq!(decoded.order().id, "o2");
        assert!(matches!(decoded, OrderEvent::OrderCompleted { .. }));
    }

    #[test]
    fn summarize_prefers_message_then_error_type() {
        let errors = vec![FrameError {
            message: None,
            error_type: Some("UnauthorizedException".to_string()),
        }];
        assert_eq!(summarize(&errors), "UnauthorizedException");
        assert_eq!(summarize(&[]), "WebSocket error");
    }
}
