//! Wire types for the periscope live-view protocol.
//!
//! This crate contains the serde-serializable types exchanged over the
//! WebSocket connection between a live-view client and the server. These
//! types represent the "protocol layer" - the shapes of data as they
//! appear on the wire.
//!
//! Types in this crate are pure data: no behavior beyond
//! serialization/deserialization. Rendered frames are not represented
//! here; they travel as raw binary messages with no envelope.

use serde::{Deserialize, Serialize};

/// Fixed logical dimensions of the rendered surface, shared by every tab
/// in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Reportable state of a single tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabState {
    pub index: usize,
    pub url: String,
    pub title: String,
}

/// Control messages sent by the client, one message per action.
///
/// Unrecognized `type` values deserialize into [`ClientMessage::Unknown`]
/// rather than failing: the protocol favors availability over strictness,
/// and the server answers them with an error message instead of dropping
/// the connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Pointer click at normalized viewport coordinates (0..1 expected,
    /// out-of-range values are dispatched as-is).
    Click { x: f64, y: f64 },
    /// Keyboard text input to the active tab.
    Type { text: String },
    /// Navigate the active tab.
    Goto { url: String },
    Keydown { key: String },
    Keyup { key: String },
    /// Wheel delta dispatched to the active tab.
    Scroll {
        #[serde(rename = "deltaX")]
        delta_x: f64,
        #[serde(rename = "deltaY")]
        delta_y: f64,
    },
    /// Open a new tab, optionally navigated; the new tab becomes active.
    NewTab {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    SwitchTab { index: usize },
    CloseTab { index: usize },
    #[serde(other)]
    Unknown,
}

/// Messages sent by the server on the same connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First message after connect.
    SessionStarted {
        #[serde(rename = "sessionId")]
        session_id: String,
        viewport: Viewport,
    },
    /// Published after every tab mutation and successful navigation.
    TabsState {
        #[serde(rename = "activeIndex")]
        active_index: usize,
        tabs: Vec<TabState>,
    },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> ClientMessage {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn click_round_trip() {
        let msg = decode(json!({"type": "click", "x": 0.25, "y": 0.75}));
        assert_eq!(msg, ClientMessage::Click { x: 0.25, y: 0.75 });

        let encoded = serde_json::to_value(&msg).unwrap();
        assert_eq!(encoded["type"], "click");
        assert_eq!(encoded["x"], 0.25);
    }

    #[test]
    fn scroll_uses_camel_case_deltas() {
        let msg = decode(json!({"type": "scroll", "deltaX": -3.0, "deltaY": 120.0}));
        assert_eq!(
            msg,
            ClientMessage::Scroll {
                delta_x: -3.0,
                delta_y: 120.0
            }
        );
    }

    #[test]
    fn new_tab_url_is_optional() {
        assert_eq!(
            decode(json!({"type": "new_tab"})),
            ClientMessage::NewTab { url: None }
        );
        assert_eq!(
            decode(json!({"type": "new_tab", "url": "https://example.com"})),
            ClientMessage::NewTab {
                url: Some("https://example.com".into())
            }
        );
    }

    #[test]
    fn tab_messages_round_trip() {
        assert_eq!(
            decode(json!({"type": "switch_tab", "index": 2})),
            ClientMessage::SwitchTab { index: 2 }
        );
        assert_eq!(
            decode(json!({"type": "close_tab", "index": 0})),
            ClientMessage::CloseTab { index: 0 }
        );
    }

    #[test]
    fn unknown_type_is_accepted_syntactically() {
        assert_eq!(
            decode(json!({"type": "teleport", "x": 1})),
            ClientMessage::Unknown
        );
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>("{not json").is_err());
        // A well-formed message with a bad payload is malformed too.
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"click","x":"a","y":0}"#).is_err());
    }

    #[test]
    fn session_started_wire_shape() {
        let msg = ServerMessage::SessionStarted {
            session_id: "abc".into(),
            viewport: Viewport {
                width: 1024,
                height: 576,
            },
        };
        let encoded = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            encoded,
            json!({
                "type": "session_started",
                "sessionId": "abc",
                "viewport": {"width": 1024, "height": 576}
            })
        );
    }

    #[test]
    fn tabs_state_wire_shape() {
        let msg = ServerMessage::TabsState {
            active_index: 1,
            tabs: vec![TabState {
                index: 0,
                url: "https://example.com/".into(),
                title: "Example".into(),
            }],
        };
        let encoded = serde_json::to_value(&msg).unwrap();
        assert_eq!(encoded["type"], "tabs_state");
        assert_eq!(encoded["activeIndex"], 1);
        assert_eq!(encoded["tabs"][0]["url"], "https://example.com/");
    }
}
