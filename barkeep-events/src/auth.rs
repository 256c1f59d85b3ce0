//! API-key authentication for the realtime events endpoint
//!
//! The events service authenticates WebSocket connections through a
//! subprotocol token: the authorization object is base64url-encoded (no
//! padding) and offered as `header-{token}` next to the protocol name.
//! The same authorization object is resent inside the `subscribe` frame.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Serialize;

/// Subprotocol identifying the event-stream dialect
pub const EVENT_STREAM_PROTOCOL: &str = "aws-appsync-event-ws";

/// Authorization object for API-key auth
///
/// `host` must be the HTTP API domain, not the realtime one.
#[derive(Debug, Clone, Serialize)]
pub struct Authorization {
    pub host: String,
    #[serde(rename = "x-api-key")]
    pub api_key: String,
}

/// Connection parameters for the realtime endpoint
#[derive(Debug, Clone)]
pub struct EventsAuth {
    scheme: String,
    realtime_domain: String,
    http_domain: String,
    api_key: String,
}

impl EventsAuth {
    /// Build auth material from the realtime endpoint and an API key
    ///
    /// Accepts the endpoint with or without a scheme. The realtime domain
    /// (`*.appsync-realtime-api.*`) is mapped to its HTTP counterpart
    /// (`*.appsync-api.*`) for the authorization `host` field.
    pub fn new(realtime_endpoint: &str, api_key: impl Into<String>) -> Self {
        let trimmed = realtime_endpoint.trim();
        // Plain ws:// is kept for local endpoints; everything else is wss.
        let (scheme, rest) = match trimmed.strip_prefix("ws://") {
            Some(rest) => ("ws", rest),
            None => (
                "wss",
                trimmed
                    .trim_start_matches("wss://")
                    .trim_start_matches("https://"),
            ),
        };
        let realtime_domain = rest.trim_end_matches('/').to_string();
        let http_domain = realtime_domain.replace("appsync-realtime-api", "appsync-api");

        Self {
            scheme: scheme.to_string(),
            realtime_domain,
            http_domain,
            api_key: api_key.into(),
        }
    }

    /// URL the WebSocket connects to
    pub fn ws_url(&self) -> String {
        format!("{}://{}/event/realtime", self.scheme, self.realtime_domain)
    }

    /// Fresh authorization object, scoped for connect or subscribe frames
    pub fn authorization(&self) -> Authorization {
        Authorization {
            host: self.http_domain.clone(),
            api_key: self.api_key.clone(),
        }
    }

    /// The `header-{base64url(json(authorization))}` subprotocol token
    pub fn auth_protocol(&self) -> String {
        let json =
            serde_json::to_string(&self.authorization()).expect("authorization serializes");
        format!("header-{}", URL_SAFE_NO_PAD.encode(json))
    }

    /// Value for the `Sec-WebSocket-Protocol` request header
    pub fn subprotocol_header(&self) -> String {
        format!("{}, {}", EVENT_STREAM_PROTOCOL, self.auth_protocol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "wss://abc123.appsync-realtime-api.eu-north-1.amazonaws.com";

    #[test]
    fn derives_http_domain_from_realtime_domain() {
        let auth = EventsAuth::new(ENDPOINT, "key-1");
        assert_eq!(
            auth.ws_url(),
            "wss://abc123.appsync-realtime-api.eu-north-1.amazonaws.com/event/realtime"
        );
        assert_eq!(
            auth.authorization().host,
            "abc123.appsync-api.eu-north-1.amazonaws.com"
        );
    }

    #[test]
    fn accepts_https_scheme_and_trailing_slash() {
        let auth = EventsAuth::new(
            "https://abc123.appsync-realtime-api.eu-north-1.amazonaws.com/",
            "key-1",
        );
        assert_eq!(
            auth.ws_url(),
            "wss://abc123.appsync-realtime-api.eu-north-1.amazonaws.com/event/realtime"
        );
    }

    #[test]
    fn keeps_plain_ws_for_local_endpoints() {
        let auth = EventsAuth::new("ws://127.0.0.1:9999", "key-1");
        assert_eq!(auth.ws_url(), "ws://127.0.0.1:9999/event/realtime");
        assert_eq!(auth.authorization().host, "127.0.0.1:9999");
    }

    #[test]
    fn auth_protocol_is_unpadded_base64url() {
        let auth = EventsAuth::new(ENDPOINT, "key+with/specials");
        let token = auth.auth_protocol();
        let encoded = token.strip_prefix("header-").expect("header- prefix");

        assert!(!encoded.contains('='));
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));

        let decoded = URL_SAFE_NO_PAD.decode(encoded).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(
            value["host"],
            "abc123.appsync-api.eu-north-1.amazonaws.com"
        );
        assert_eq!(value["x-api-key"], "key+with/specials");
    }

    #[test]
    fn subprotocol_header_lists_dialect_first() {
        let auth = EventsAuth::new(ENDPOINT, "key-1");
        let header = auth.subprotocol_header();
        assert!(header.starts_with("aws-appsync-event-ws, header-"));
    }
}
