//! Wire protocol: JSON text frames, one self-contained object per frame,
//! discriminated by a `type` tag. Unknown and extra fields are ignored,
//! which keeps the format forward-compatible by omission.

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Events a client may send. Frames that fail to parse into one of these
/// variants (bad JSON, unknown type, missing field) are dropped by the hub.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientEvent {
    /// First-time name announcement. Alias of `Rename`.
    Join {
        name: String,
    },
    /// Later name change. Alias of `Join`.
    Rename {
        #[serde(rename = "newName")]
        new_name: String,
    },
    /// A user-authored message, broadcast verbatim.
    Chat {
        text: String,
    },
}

/// Events the server emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// Sent once, to the new connection only, immediately after registration.
    Welcome {
        #[serde(rename = "selfName")]
        self_name: String,
        timestamp: String,
    },
    /// Human-readable notice of a join/leave/rename, sent to all.
    System {
        text: String,
        timestamp: String,
    },
    /// Full roster snapshot, sent to all after any membership or name change.
    Presence {
        users: Vec<String>,
    },
    /// A user-authored message, sent to all including the sender.
    Chat {
        user: String,
        text: String,
        timestamp: String,
    },
}

impl ServerEvent {
    pub fn welcome(self_name: impl Into<String>) -> Self {
        Self::Welcome {
            self_name: self_name.into(),
            timestamp: now_timestamp(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::System {
            text: text.into(),
            timestamp: now_timestamp(),
        }
    }

    pub fn presence(users: Vec<String>) -> Self {
        Self::Presence { users }
    }

    pub fn chat(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Chat {
            user: user.into(),
            text: text.into(),
            timestamp: now_timestamp(),
        }
    }
}

/// Server-side emission time: RFC 3339 UTC, millisecond precision, `Z` suffix.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Default display name assigned at connect time.
pub fn default_display_name() -> String {
    let n: u16 = rand::rng().random_range(100..1000);
    format!("Usuario_{}", n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_event_wire_shape() {
        let event = ServerEvent::Welcome {
            self_name: "Usuario_123".to_string(),
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
        };
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "welcome",
                "selfName": "Usuario_123",
                "timestamp": "2026-01-01T00:00:00.000Z",
            })
        );

        let event = ServerEvent::presence(vec!["Ada".to_string(), "Eva".to_string()]);
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(value, json!({"type": "presence", "users": ["Ada", "Eva"]}));
    }

    #[test]
    fn test_client_event_parses_camel_case_fields() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"rename","newName":"Ada"}"#).unwrap();
        assert!(matches!(event, ClientEvent::Rename { new_name } if new_name == "Ada"));

        let event: ClientEvent = serde_json::from_str(r#"{"type":"join","name":"Eva"}"#).unwrap();
        assert!(matches!(event, ClientEvent::Join { name } if name == "Eva"));
    }

    #[test]
    fn test_client_event_ignores_extra_fields() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"chat","text":"hola","extra":42}"#).unwrap();
        assert!(matches!(event, ClientEvent::Chat { text } if text == "hola"));
    }

    #[test]
    fn test_client_event_rejects_unknown_type_and_missing_fields() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"mystery"}"#).is_err());
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"chat"}"#).is_err());
        assert!(serde_json::from_str::<ClientEvent>("not json at all").is_err());
    }

    #[test]
    fn test_default_display_name_range() {
        for _ in 0..100 {
            let name = default_display_name();
            let suffix = name
                .strip_prefix("Usuario_")
                .expect("name should start with Usuario_");
            let n: u16 = suffix.parse().expect("numeric suffix");
            assert!((100..=999).contains(&n), "suffix out of range: {}", n);
        }
    }

    #[test]
    fn test_timestamp_is_rfc3339_utc() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'), "timestamp should use Z suffix: {}", ts);
        chrono::DateTime::parse_from_rfc3339(&ts).expect("valid RFC 3339 timestamp");
    }
}
