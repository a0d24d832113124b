//! Bindings from the generic frame loop onto a CDP session and a
//! WebSocket connection.

use std::sync::Arc;

use async_trait::async_trait;
use periscope::error::{Error, Result};
use periscope::input;
use periscope::session::SessionId;
use periscope::stream::{FrameSink, FrameSource};
use periscope::Registry;
use periscope_protocol::ServerMessage;

use crate::outbound::Outbound;

/// Captures JPEG frames of a session's active tab.
pub struct CdpFrameSource {
    registry: Arc<Registry>,
    session: SessionId,
    jpeg_quality: i64,
}

impl CdpFrameSource {
    pub fn new(registry: Arc<Registry>, session: SessionId, jpeg_quality: i64) -> Self {
        Self {
            registry,
            session,
            jpeg_quality,
        }
    }
}

#[async_trait]
impl FrameSource for CdpFrameSource {
    async fn capture(&self) -> Result<Option<Vec<u8>>> {
        let Some(page) = self.registry.active_page(&self.session).await else {
            return Ok(None);
        };
        input::capture_jpeg(&page, self.jpeg_quality).await.map(Some)
    }
}

/// Pushes frames into a connection's outbound queue.
pub struct WsFrameSink {
    outbound: Outbound,
}

impl WsFrameSink {
    pub fn new(outbound: Outbound) -> Self {
        Self { outbound }
    }
}

#[async_trait]
impl FrameSink for WsFrameSink {
    fn queued_bytes(&self) -> usize {
        self.outbound.queued_bytes()
    }

    async fn send_frame(&self, frame: Vec<u8>) -> Result<()> {
        if self.outbound.send_frame(frame) {
            Ok(())
        } else {
            Err(Error::ConnectionClosed)
        }
    }

    async fn send_error(&self, message: String) {
        self.outbound.send_control(&ServerMessage::Error { message });
    }
}
