//! Control message dispatch: one inbound JSON text message in, zero or
//! more outbound state/error messages back.
//!
//! Messages from one connection are handled strictly in arrival order;
//! the read loop awaits each dispatch before pulling the next message.
//! Per-message failures are reported on the same connection and never
//! tear the session down.

use periscope::error::Result;
use periscope::registry::Registry;
use periscope::session::{CloseTab, SessionId};
use periscope::{input, nav};
use periscope_protocol::{ClientMessage, ServerMessage};
use tracing::{debug, warn};

use crate::outbound::Outbound;

pub async fn handle_text(registry: &Registry, id: &SessionId, text: &str, outbound: &Outbound) {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(error) => {
            warn!(
                target = "periscope.control",
                id = %id,
                error = %error,
                "rejected malformed control message"
            );
            send_error(outbound, format!("invalid control message: {error}"));
            return;
        }
    };

    if let Err(error) = dispatch(registry, id, message, outbound).await {
        debug!(
            target = "periscope.control",
            id = %id,
            error = %error,
            "control action failed"
        );
        send_error(outbound, error.to_string());
    }
}

async fn dispatch(
    registry: &Registry,
    id: &SessionId,
    message: ClientMessage,
    outbound: &Outbound,
) -> Result<()> {
    match message {
        ClientMessage::Click { x, y } => {
            let ctx = registry.active_context(id).await?;
            input::click(&ctx.page, ctx.viewport, x, y).await
        }
        ClientMessage::Type { text } => {
            let ctx = registry.active_context(id).await?;
            input::type_text(&ctx.page, &text, ctx.typing_delay).await
        }
        ClientMessage::Goto { url } => {
            let url = nav::normalize_url(&url)?;
            let ctx = registry.active_context(id).await?;
            input::goto(&ctx.page, &url).await?;
            publish_tabs_state(registry, id, outbound).await
        }
        ClientMessage::Keydown { key } => {
            let ctx = registry.active_context(id).await?;
            input::key_event(&ctx.page, &key, true).await
        }
        ClientMessage::Keyup { key } => {
            let ctx = registry.active_context(id).await?;
            input::key_event(&ctx.page, &key, false).await
        }
        ClientMessage::Scroll { delta_x, delta_y } => {
            let ctx = registry.active_context(id).await?;
            input::scroll(&ctx.page, ctx.viewport, delta_x, delta_y).await
        }
        ClientMessage::NewTab { url } => {
            let handle = match registry.session(id) {
                Some(handle) => handle,
                None => return Err(periscope::Error::UnknownSession(id.clone())),
            };
            {
                let mut session = handle.lock().await;
                session.open_tab(url.as_deref()).await?;
            }
            publish_tabs_state(registry, id, outbound).await
        }
        ClientMessage::SwitchTab { index } => {
            let handle = match registry.session(id) {
                Some(handle) => handle,
                None => return Err(periscope::Error::UnknownSession(id.clone())),
            };
            {
                let mut session = handle.lock().await;
                if !session.switch_tab(index) {
                    debug!(
                        target = "periscope.control",
                        id = %id,
                        index,
                        "switch_tab index out of range; ignored"
                    );
                }
            }
            // The state report doubles as the correction for an ignored
            // out-of-range switch.
            publish_tabs_state(registry, id, outbound).await
        }
        ClientMessage::CloseTab { index } => {
            let handle = match registry.session(id) {
                Some(handle) => handle,
                None => return Err(periscope::Error::UnknownSession(id.clone())),
            };
            let outcome = {
                let mut session = handle.lock().await;
                session.close_tab(index).await
            };
            match outcome {
                CloseTab::SessionEmpty => {
                    registry.destroy(id).await;
                    Ok(())
                }
                CloseTab::Closed | CloseTab::Ignored => {
                    publish_tabs_state(registry, id, outbound).await
                }
            }
        }
        ClientMessage::Unknown => {
            warn!(
                target = "periscope.control",
                id = %id,
                "ignoring control message of unknown type"
            );
            send_error(outbound, "unsupported control message type".to_string());
            Ok(())
        }
    }
}

/// Sends the full tabs report after any operation that changed the tab
/// list or what it displays.
async fn publish_tabs_state(registry: &Registry, id: &SessionId, outbound: &Outbound) -> Result<()> {
    let handle = registry
        .session(id)
        .ok_or_else(|| periscope::Error::UnknownSession(id.clone()))?;
    let snapshot = {
        let session = handle.lock().await;
        session.snapshot().await
    };
    outbound.send_control(&ServerMessage::TabsState {
        active_index: snapshot.active_index,
        tabs: snapshot.tabs,
    });
    Ok(())
}

fn send_error(outbound: &Outbound, message: String) {
    outbound.send_control(&ServerMessage::Error { message });
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::extract::ws::Message;
    use periscope::config::SessionConfig;

    use crate::outbound::{self, OutboundReceiver};

    fn empty_registry() -> Registry {
        Registry::new(SessionConfig::default())
    }

    async fn recv_error(rx: &mut OutboundReceiver) -> String {
        let (message, _) = rx.recv().await.expect("expected an outbound message");
        let Message::Text(text) = message else {
            panic!("expected a text message, got {message:?}");
        };
        match serde_json::from_str::<ServerMessage>(text.as_str()).unwrap() {
            ServerMessage::Error { message } => message,
            other => panic!("expected an error message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_answers_with_error() {
        let registry = empty_registry();
        let id = SessionId::new();
        let (tx, mut rx) = outbound::channel();

        handle_text(&registry, &id, "{not json", &tx).await;

        let message = recv_error(&mut rx).await;
        assert!(message.contains("invalid control message"), "{message}");
    }

    #[tokio::test]
    async fn bad_payload_answers_with_error() {
        let registry = empty_registry();
        let id = SessionId::new();
        let (tx, mut rx) = outbound::channel();

        handle_text(&registry, &id, r#"{"type":"click","x":"a","y":0}"#, &tx).await;

        let message = recv_error(&mut rx).await;
        assert!(message.contains("invalid control message"), "{message}");
    }

    #[tokio::test]
    async fn unknown_message_type_answers_with_error() {
        let registry = empty_registry();
        let id = SessionId::new();
        let (tx, mut rx) = outbound::channel();

        handle_text(&registry, &id, r#"{"type":"teleport","x":1}"#, &tx).await;

        let message = recv_error(&mut rx).await;
        assert_eq!(message, "unsupported control message type");
    }

    #[tokio::test]
    async fn input_for_unknown_session_answers_with_error() {
        let registry = empty_registry();
        let id = SessionId::new();
        let (tx, mut rx) = outbound::channel();

        handle_text(&registry, &id, r#"{"type":"click","x":0.5,"y":0.5}"#, &tx).await;

        let message = recv_error(&mut rx).await;
        assert!(message.contains("unknown session"), "{message}");
    }

    #[tokio::test]
    async fn tab_mutation_for_unknown_session_answers_with_error() {
        let registry = empty_registry();
        let id = SessionId::new();
        let (tx, mut rx) = outbound::channel();

        handle_text(&registry, &id, r#"{"type":"new_tab"}"#, &tx).await;

        let message = recv_error(&mut rx).await;
        assert!(message.contains("unknown session"), "{message}");
    }

    #[tokio::test]
    async fn destroy_on_unknown_session_is_a_noop() {
        let registry = empty_registry();
        let id = SessionId::new();

        registry.destroy(&id).await;
        registry.destroy(&id).await;

        assert!(registry.session(&id).is_none());
    }
}
