use std::time::Duration;

use periscope_protocol::Viewport;

/// Per-session settings fixed at creation time.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// URL the first tab of a new session is navigated to.
    pub start_url: String,
    /// Logical dimensions shared by every tab in the session; also the
    /// basis for converting normalized pointer coordinates.
    pub viewport: Viewport,
    /// Inter-character delay when emulating typed input.
    pub typing_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_url: "about:blank".to_string(),
            viewport: Viewport {
                width: 1024,
                height: 576,
            },
            typing_delay: Duration::from_millis(30),
        }
    }
}

/// Settings for the frame streaming loop.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Target capture cadence (10 fps by default).
    pub frame_interval: Duration,
    /// Outbound bytes above which the cycle skips capture entirely.
    /// Frames are dropped, never queued, under sustained backpressure.
    pub backpressure_limit: usize,
    /// Sleep before re-checking a backpressured transport.
    pub backoff: Duration,
    /// JPEG compression quality, trading latency for payload size.
    pub jpeg_quality: i64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(100),
            backpressure_limit: 1024 * 1024,
            backoff: Duration::from_millis(50),
            jpeg_quality: 60,
        }
    }
}
