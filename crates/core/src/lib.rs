//! Core machinery for periscope: the session registry, tab
//! multiplexing, CDP input primitives, and the transport-agnostic frame
//! streaming loop.
//!
//! External collaborators (automation agents, action endpoints) consume
//! exactly two read operations from [`registry::Registry`]: resolving a
//! session id to its active page handle, and resolving it to the full
//! session record. Everything else in this crate is plumbing for the
//! live-view server.

pub mod config;
pub mod error;
pub mod input;
pub mod nav;
pub mod registry;
pub mod session;
pub mod stream;

pub use error::{Error, Result};
pub use registry::Registry;
pub use session::{Session, SessionId};
