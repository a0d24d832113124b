use thiserror::Error;

use crate::session::SessionId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The browser process could not start; fatal to session creation.
    /// Callers must not retry automatically.
    #[error("failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("session has no open tab")]
    NoActiveTab,

    #[error("not a navigable http(s) url: {0}")]
    InvalidUrl(String),

    #[error("invalid input event: {0}")]
    InvalidInput(String),

    #[error("frame capture failed: {0}")]
    Capture(String),

    /// The connection's outbound queue is gone.
    #[error("connection closed")]
    ConnectionClosed,

    #[error(transparent)]
    Cdp(#[from] chromiumoxide::error::CdpError),
}
