//! Single-writer outbound queue with a byte gauge.
//!
//! Control messages and frames from concurrent tasks funnel through one
//! channel so exactly one task writes to the socket. The gauge counts
//! bytes enqueued but not yet written; the frame loop reads it as its
//! backpressure signal. Costs are charged on enqueue and released only
//! after the socket write completes, so the gauge covers the channel and
//! the in-flight write.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::ws::Message;
use periscope_protocol::ServerMessage;
use tokio::sync::mpsc;
use tracing::warn;

pub fn channel() -> (Outbound, OutboundReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let queued = Arc::new(AtomicUsize::new(0));
    (
        Outbound {
            tx,
            queued: Arc::clone(&queued),
        },
        OutboundReceiver { rx, queued },
    )
}

/// Cloneable sending half; every producer task holds one.
#[derive(Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<(Message, usize)>,
    queued: Arc<AtomicUsize>,
}

impl Outbound {
    /// Bytes accepted but not yet written to the socket.
    pub fn queued_bytes(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Serializes and enqueues a control message. Returns `false` when
    /// the connection is gone.
    pub fn send_control(&self, message: &ServerMessage) -> bool {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(error) => {
                warn!(
                    target = "periscope.ws",
                    error = %error,
                    "failed to serialize server message"
                );
                return false;
            }
        };
        let cost = text.len();
        self.enqueue(Message::Text(text.into()), cost)
    }

    /// Enqueues a binary frame. Returns `false` when the connection is
    /// gone.
    pub fn send_frame(&self, frame: Vec<u8>) -> bool {
        let cost = frame.len();
        self.enqueue(Message::Binary(frame.into()), cost)
    }

    fn enqueue(&self, message: Message, cost: usize) -> bool {
        self.queued.fetch_add(cost, Ordering::SeqCst);
        if self.tx.send((message, cost)).is_err() {
            self.queued.fetch_sub(cost, Ordering::SeqCst);
            return false;
        }
        true
    }
}

/// Receiving half, owned by the single writer task.
pub struct OutboundReceiver {
    rx: mpsc::UnboundedReceiver<(Message, usize)>,
    queued: Arc<AtomicUsize>,
}

impl OutboundReceiver {
    pub async fn recv(&mut self) -> Option<(Message, usize)> {
        self.rx.recv().await
    }

    /// Releases a message's cost from the gauge after the socket write
    /// finishes.
    pub fn complete(&self, cost: usize) {
        self.queued.fetch_sub(cost, Ordering::SeqCst);
    }
}
