//! The `/live` WebSocket endpoint: one connection is one session.
//!
//! Each accepted connection launches a browser session, spawns the frame
//! loop and a single socket writer, then reads control messages
//! sequentially until the socket closes. Teardown always destroys the
//! session; an abandoned connection never leaks a browser process.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use periscope::Registry;
use periscope::config::StreamConfig;
use periscope_protocol::ServerMessage;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::frames::{CdpFrameSource, WsFrameSink};
use crate::handler;
use crate::outbound;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub stream: StreamConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/live", get(upgrade)).with_state(state)
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_connection(socket, state))
}

async fn serve_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let id = match state.registry.create().await {
        Ok((id, _)) => id,
        Err(err) => {
            error!(target = "periscope.ws", error = %err, "session launch failed");
            let failure = ServerMessage::Error {
                message: "could not create session".to_string(),
            };
            if let Ok(text) = serde_json::to_string(&failure) {
                let _ = ws_tx.send(Message::Text(text.into())).await;
            }
            let _ = ws_tx.send(Message::Close(None)).await;
            return;
        }
    };

    let (outbound_tx, mut outbound_rx) = outbound::channel();

    outbound_tx.send_control(&ServerMessage::SessionStarted {
        session_id: id.to_string(),
        viewport: state.registry.config().viewport,
    });

    // Sole socket writer; producers go through the outbound queue.
    let writer = tokio::spawn(async move {
        while let Some((message, cost)) = outbound_rx.recv().await {
            if ws_tx.send(message).await.is_err() {
                break;
            }
            outbound_rx.complete(cost);
        }
    });

    let (stop_tx, stop_rx) = watch::channel(false);
    let frame_loop = {
        let source = CdpFrameSource::new(
            Arc::clone(&state.registry),
            id.clone(),
            state.stream.jpeg_quality,
        );
        let sink = WsFrameSink::new(outbound_tx.clone());
        let config = state.stream.clone();
        tokio::spawn(async move {
            periscope::stream::run(&source, &sink, &config, stop_rx).await;
        })
    };

    info!(target = "periscope.ws", id = %id, "connection established");

    while let Some(incoming) = ws_rx.next().await {
        match incoming {
            Ok(Message::Text(text)) => {
                handler::handle_text(&state.registry, &id, text.as_str(), &outbound_tx).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(error) => {
                debug!(target = "periscope.ws", id = %id, error = %error, "socket read failed");
                break;
            }
        }
    }

    let _ = stop_tx.send(true);
    state.registry.destroy(&id).await;
    let _ = frame_loop.await;
    writer.abort();

    info!(target = "periscope.ws", id = %id, "connection closed");
}
