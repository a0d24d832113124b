//! One isolated browser process plus its ordered tab list.

use std::fmt;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport as EmulatedViewport;
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use periscope_protocol::{TabState, Viewport};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{Error, Result};

/// Title reported for tabs whose real title cannot be read, e.g. a
/// freshly opened blank tab.
pub const FALLBACK_TITLE: &str = "Untitled";

/// Opaque, globally unique session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a `close_tab` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseTab {
    /// Tab removed; at least one tab remains.
    Closed,
    /// The last tab was removed; the caller must destroy the session.
    SessionEmpty,
    /// Out-of-range index; state unchanged.
    Ignored,
}

struct Tab {
    page: Page,
}

/// Current URL/title of every tab plus the active index, for reporting.
#[derive(Debug, Clone)]
pub struct TabsSnapshot {
    pub active_index: usize,
    pub tabs: Vec<TabState>,
}

/// One browser process, its ordered tab list (insertion order, never
/// reordered), and the active-tab index.
///
/// A session lives behind a `tokio::sync::Mutex`; tab-list mutation and
/// active-tab lookup happen under it, while long CDP calls run on page
/// handles cloned out of the lock so navigation never blocks frame
/// capture. Invariant: `active < tabs.len()` whenever the tab list is
/// non-empty. A session whose last tab closed must be destroyed through
/// the registry and never referenced again.
pub struct Session {
    id: SessionId,
    browser: Browser,
    handler_task: JoinHandle<()>,
    tabs: Vec<Tab>,
    active: usize,
    viewport: Viewport,
    typing_delay: Duration,
}

impl Session {
    /// Launches an isolated headless browser with one tab navigated to
    /// the configured start URL.
    pub(crate) async fn launch(config: &SessionConfig) -> Result<Self> {
        let id = SessionId::new();
        let viewport = config.viewport;

        let browser_config = BrowserConfig::builder()
            .window_size(viewport.width, viewport.height)
            .viewport(EmulatedViewport {
                width: viewport.width,
                height: viewport.height,
                ..Default::default()
            })
            .build()
            .map_err(Error::BrowserLaunch)?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| Error::BrowserLaunch(e.to_string()))?;

        // The handler stream must be polled for the whole browser
        // lifetime; every CDP call stalls otherwise.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page(config.start_url.as_str()).await {
            Ok(page) => page,
            Err(error) => {
                if let Err(close_error) = browser.close().await {
                    warn!(
                        target = "periscope.session",
                        error = %close_error,
                        "failed to close browser after failed first tab"
                    );
                }
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(Error::BrowserLaunch(error.to_string()));
            }
        };

        debug!(
            target = "periscope.session",
            id = %id,
            start_url = %config.start_url,
            "session launched"
        );

        Ok(Self {
            id,
            browser,
            handler_task,
            tabs: vec![Tab { page }],
            active: 0,
            viewport,
            typing_delay: config.typing_delay,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn typing_delay(&self) -> Duration {
        self.typing_delay
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Cloned handle to the tab control actions and the frame loop
    /// target.
    pub fn active_page(&self) -> Result<Page> {
        self.tabs
            .get(self.active)
            .map(|tab| tab.page.clone())
            .ok_or(Error::NoActiveTab)
    }

    /// Opens a tab, optionally navigated, and makes it active.
    pub async fn open_tab(&mut self, url: Option<&str>) -> Result<usize> {
        let target = url.unwrap_or("about:blank");
        let page = self.browser.new_page(target).await?;
        self.tabs.push(Tab { page });
        self.active = self.tabs.len() - 1;
        debug!(
            target = "periscope.session",
            id = %self.id,
            index = self.active,
            url = %target,
            "tab opened"
        );
        Ok(self.active)
    }

    /// Makes the tab at `index` active; out-of-range requests are
    /// silently ignored (returns `false`).
    pub fn switch_tab(&mut self, index: usize) -> bool {
        if index < self.tabs.len() {
            self.active = index;
            true
        } else {
            false
        }
    }

    /// Closes the tab at `index`, rebalancing the active index.
    pub async fn close_tab(&mut self, index: usize) -> CloseTab {
        if index >= self.tabs.len() {
            return CloseTab::Ignored;
        }

        let tab = self.tabs.remove(index);
        if let Err(error) = tab.page.close().await {
            warn!(
                target = "periscope.session",
                id = %self.id,
                index,
                error = %error,
                "failed to close tab page"
            );
        }

        if self.tabs.is_empty() {
            return CloseTab::SessionEmpty;
        }
        self.active = rebalance_active(self.active, index, self.tabs.len());
        debug!(
            target = "periscope.session",
            id = %self.id,
            index,
            active = self.active,
            "tab closed"
        );
        CloseTab::Closed
    }

    /// Best-effort URL/title for every tab; unreadable titles fall back
    /// to [`FALLBACK_TITLE`] rather than failing the whole snapshot.
    pub async fn snapshot(&self) -> TabsSnapshot {
        let mut tabs = Vec::with_capacity(self.tabs.len());
        for (index, tab) in self.tabs.iter().enumerate() {
            let url = tab.page.url().await.ok().flatten().unwrap_or_default();
            let title = match tab.page.get_title().await {
                Ok(Some(title)) if !title.is_empty() => title,
                _ => FALLBACK_TITLE.to_string(),
            };
            tabs.push(TabState { index, url, title });
        }
        TabsSnapshot {
            active_index: self.active,
            tabs,
        }
    }

    /// Closes every tab and terminates the browser process. Cleanup
    /// failures are logged, never propagated.
    pub(crate) async fn shutdown(&mut self) {
        for tab in self.tabs.drain(..) {
            if let Err(error) = tab.page.close().await {
                warn!(
                    target = "periscope.session",
                    id = %self.id,
                    error = %error,
                    "failed to close tab during teardown"
                );
            }
        }
        if let Err(error) = self.browser.close().await {
            warn!(
                target = "periscope.session",
                id = %self.id,
                error = %error,
                "failed to close browser process"
            );
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

/// Active-index bookkeeping after removing `removed` from a list that
/// now holds `remaining` tabs (non-zero). Removing the active tab or one
/// before it moves the active slot to the end of the list; removals
/// after the active tab leave it untouched.
fn rebalance_active(active: usize, removed: usize, remaining: usize) -> usize {
    if removed <= active || active >= remaining {
        remaining - 1
    } else {
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn removing_after_active_keeps_active() {
        assert_eq!(rebalance_active(0, 1, 2), 0);
        assert_eq!(rebalance_active(1, 2, 3), 1);
    }

    #[test]
    fn removing_active_or_before_moves_active_to_end() {
        assert_eq!(rebalance_active(1, 0, 2), 1);
        assert_eq!(rebalance_active(1, 1, 2), 1);
        assert_eq!(rebalance_active(2, 2, 2), 1);
        assert_eq!(rebalance_active(0, 0, 1), 0);
    }

    #[test]
    fn active_index_invariant_holds_for_all_inputs() {
        for len_before in 1..=8usize {
            for active in 0..len_before {
                for removed in 0..len_before {
                    let remaining = len_before - 1;
                    if remaining == 0 {
                        continue;
                    }
                    let next = rebalance_active(active, removed, remaining);
                    assert!(
                        next < remaining,
                        "active {active}, removed {removed}, remaining {remaining} -> {next}"
                    );
                }
            }
        }
    }
}
