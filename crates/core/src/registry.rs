//! The identifier-to-session map: create, lookup, destroy.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::page::Page;
use parking_lot::RwLock;
use periscope_protocol::Viewport;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::session::{Session, SessionId};

/// Everything a single control action needs, cloned out from under the
/// session lock so the action itself runs without holding it.
#[derive(Clone)]
pub struct ActiveContext {
    pub page: Page,
    pub viewport: Viewport,
    pub typing_delay: Duration,
}

/// Owns every live session.
///
/// Sessions are fully isolated; the id map is the only shared contention
/// point and its lock is never held across an await. Per-session
/// serialization happens on each session's own `tokio::sync::Mutex`.
pub struct Registry {
    config: SessionConfig,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<Session>>>>,
}

impl Registry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Launches a browser and registers the session. Nothing is left
    /// registered when the launch fails; callers must not retry
    /// automatically.
    pub async fn create(&self) -> Result<(SessionId, Arc<Mutex<Session>>)> {
        let session = Session::launch(&self.config).await?;
        let id = session.id().clone();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().insert(id.clone(), Arc::clone(&handle));
        info!(target = "periscope.registry", id = %id, "session created");
        Ok((id, handle))
    }

    /// Pure lookup of the full session record; never fails.
    pub fn session(&self, id: &SessionId) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().get(id).cloned()
    }

    /// The active tab handle for external collaborators; `None` when the
    /// session is gone or has no tabs left.
    pub async fn active_page(&self, id: &SessionId) -> Option<Page> {
        let handle = self.session(id)?;
        let session = handle.lock().await;
        session.active_page().ok()
    }

    /// Active page plus the session-fixed input parameters, for control
    /// dispatch.
    pub async fn active_context(&self, id: &SessionId) -> Result<ActiveContext> {
        let handle = self
            .session(id)
            .ok_or_else(|| Error::UnknownSession(id.clone()))?;
        let session = handle.lock().await;
        Ok(ActiveContext {
            page: session.active_page()?,
            viewport: session.viewport(),
            typing_delay: session.typing_delay(),
        })
    }

    /// Idempotent teardown, safe under concurrent invocation: the map
    /// entry is cleared atomically before any teardown work, so a second
    /// caller finds nothing to do. Unknown ids are a no-op.
    pub async fn destroy(&self, id: &SessionId) {
        let Some(handle) = self.sessions.write().remove(id) else {
            debug!(target = "periscope.registry", id = %id, "destroy on unknown session; ignored");
            return;
        };
        let mut session = handle.lock().await;
        session.shutdown().await;
        info!(target = "periscope.registry", id = %id, "session destroyed");
    }
}
