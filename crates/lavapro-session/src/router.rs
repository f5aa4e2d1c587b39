//! Role-based view router.
//!
//! Holds the [`ViewState`] machine from `lavapro-core` and publishes every
//! transition. Events that do not apply leave the state unchanged.

use lavapro_core::access::ViewAction;
use lavapro_core::{ViewEvent, ViewState};
use tokio::sync::watch;
use tracing::{debug, info};

/// Publishes which layout is showing.
pub struct ViewRouter {
    state: watch::Sender<ViewState>,
}

impl Default for ViewRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewRouter {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ViewState::Unauthenticated);
        ViewRouter { state }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> ViewState {
        *self.state.borrow()
    }

    /// Feeds one event and returns the resulting state.
    pub fn apply(&self, event: ViewEvent) -> ViewState {
        let from = self.current();
        let to = from.apply(event);
        if to == from {
            debug!(state = ?from, event = ?event, "View event ignored");
        } else {
            info!(from = ?from, to = ?to, event = ?event, "View changed");
            self.state.send_replace(to);
        }
        to
    }

    /// Whether the current view offers `action`.
    pub fn offers(&self, action: ViewAction) -> bool {
        self.current().actions().contains(&action)
    }
}
