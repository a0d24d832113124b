use std::time::Duration;

use clap::Parser;
use periscope::config::{SessionConfig, StreamConfig};
use periscope_protocol::Viewport;

#[derive(Parser, Debug)]
#[command(name = "periscoped", about = "Live browser view and control server")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Address to bind the WebSocket listener on
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the WebSocket listener on
    #[arg(short, long, default_value_t = 8787)]
    pub port: u16,

    /// URL the first tab of every new session opens
    #[arg(long, default_value = "about:blank")]
    pub start_url: String,

    /// Logical viewport width in pixels
    #[arg(long, default_value_t = 1024)]
    pub viewport_width: u32,

    /// Logical viewport height in pixels
    #[arg(long, default_value_t = 576)]
    pub viewport_height: u32,

    /// Target frame rate of the live stream (clamped to 1..=1000)
    #[arg(long, default_value_t = 10)]
    pub fps: u32,

    /// JPEG quality of streamed frames (1-100)
    #[arg(long, default_value_t = 60)]
    pub jpeg_quality: u8,

    /// Outbound queue size in bytes above which frames are dropped
    #[arg(long, default_value_t = 1_048_576)]
    pub backpressure_limit: usize,

    /// Delay between emulated keystrokes in milliseconds
    #[arg(long, default_value_t = 30)]
    pub typing_delay_ms: u64,
}

impl Cli {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            start_url: self.start_url.clone(),
            viewport: Viewport {
                width: self.viewport_width,
                height: self.viewport_height,
            },
            typing_delay: Duration::from_millis(self.typing_delay_ms),
        }
    }

    pub fn stream_config(&self) -> StreamConfig {
        // A zero-length interval would panic the frame loop's ticker.
        let fps = self.fps.clamp(1, 1000);
        StreamConfig {
            frame_interval: Duration::from_millis(1000 / u64::from(fps)),
            backpressure_limit: self.backpressure_limit,
            backoff: Duration::from_millis(50),
            jpeg_quality: i64::from(self.jpeg_quality),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_expected_session_shape() {
        let cli = Cli::parse_from(["periscoped"]);
        let session = cli.session_config();
        assert_eq!(session.viewport.width, 1024);
        assert_eq!(session.viewport.height, 576);
        assert_eq!(session.start_url, "about:blank");
        assert_eq!(session.typing_delay, Duration::from_millis(30));
        assert_eq!(cli.port, 8787);
    }

    #[test]
    fn fps_controls_frame_interval() {
        let cli = Cli::parse_from(["periscoped", "--fps", "20"]);
        assert_eq!(cli.stream_config().frame_interval, Duration::from_millis(50));
    }

    #[test]
    fn zero_fps_is_clamped() {
        let cli = Cli::parse_from(["periscoped", "--fps", "0"]);
        assert_eq!(
            cli.stream_config().frame_interval,
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn excessive_fps_never_produces_a_zero_interval() {
        let cli = Cli::parse_from(["periscoped", "--fps", "100000"]);
        assert_eq!(cli.stream_config().frame_interval, Duration::from_millis(1));
    }

    #[test]
    fn verbosity_flags_accumulate() {
        let cli = Cli::parse_from(["periscoped", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }
}
