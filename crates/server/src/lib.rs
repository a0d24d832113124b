//! WebSocket front end for the periscope session engine: one connection
//! per session, JSON control messages inbound, JPEG frames and state
//! reports outbound.

pub mod cli;
pub mod frames;
pub mod handler;
pub mod logging;
pub mod outbound;
pub mod ws;
