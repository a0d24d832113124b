//! The transport-agnostic frame streaming loop.
//!
//! One loop runs per session, concurrently with control dispatch. It
//! captures the active tab at a fixed cadence, dropping frames outright
//! whenever the transport reports backpressure: a live view has no use
//! for stale frames, and dropping bounds memory under a slow client.

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::StreamConfig;
use crate::error::Result;

/// Produces one compressed frame of the active tab per call.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// `Ok(None)` means the session has no active tab left and the loop
    /// must terminate.
    async fn capture(&self) -> Result<Option<Vec<u8>>>;
}

/// Accepts frames and best-effort error reports for one connection.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Bytes enqueued for the transport but not yet written; the
    /// backpressure signal.
    fn queued_bytes(&self) -> usize;

    async fn send_frame(&self, frame: Vec<u8>) -> Result<()>;

    /// Best-effort; failures are ignored because the transport may
    /// already be gone.
    async fn send_error(&self, message: String);
}

/// Runs the capture/send cycle until the stop signal flips, the session
/// runs out of tabs, or a capture/send failure occurs. The stop signal
/// is honored at cycle boundaries, never mid-capture.
pub async fn run<S, K>(source: &S, sink: &K, config: &StreamConfig, mut stop: watch::Receiver<bool>)
where
    S: FrameSource,
    K: FrameSink,
{
    let mut ticker = time::interval(config.frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    debug!(target = "periscope.stream", "stop requested");
                    return;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        if sink.queued_bytes() > config.backpressure_limit {
            // Skip this frame entirely and check again shortly.
            time::sleep(config.backoff).await;
            continue;
        }

        match source.capture().await {
            Ok(Some(frame)) => {
                if let Err(error) = sink.send_frame(frame).await {
                    debug!(
                        target = "periscope.stream",
                        error = %error,
                        "frame send failed; stopping stream"
                    );
                    sink.send_error(format!("frame streaming stopped: {error}"))
                        .await;
                    return;
                }
            }
            Ok(None) => {
                debug!(target = "periscope.stream", "no active tab; stopping stream");
                return;
            }
            Err(error) => {
                warn!(
                    target = "periscope.stream",
                    error = %error,
                    "frame capture failed; stopping stream"
                );
                sink.send_error(format!("frame capture failed: {error}"))
                    .await;
                return;
            }
        }
    }
}
