//! Chooses the top-level navigation stack from the session status.

use serde::Serialize;
use tokio::sync::watch;

use crate::auth::{Session, SessionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavigationRoot {
    /// Welcome, login and signup screens.
    AuthFlow,
    /// Dashboard, vendors, bookings, menus, chat.
    MainFlow,
}

impl NavigationRoot {
    pub fn for_status(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Authenticated => NavigationRoot::MainFlow,
            SessionStatus::Unauthenticated
            | SessionStatus::Authenticating
            | SessionStatus::Error => NavigationRoot::AuthFlow,
        }
    }

    pub fn for_session(session: &Session) -> Self {
        Self::for_status(session.status())
    }
}

/// Follows session changes and reports the active root.
pub struct SessionGate {
    rx: watch::Receiver<Session>,
}

impl SessionGate {
    pub fn new(rx: watch::Receiver<Session>) -> Self {
        Self { rx }
    }

    pub fn current(&self) -> NavigationRoot {
        NavigationRoot::for_session(&self.rx.borrow())
    }

    /// Wait for the next session change and return the root it implies.
    /// `None` once the session owner is gone.
    pub async fn changed(&mut self) -> Option<NavigationRoot> {
        self.rx.changed().await.ok()?;
        Some(NavigationRoot::for_session(&self.rx.borrow_and_update()))
    }

    /// Wait until `root` is active.
    pub async fn wait_for(&mut self, root: NavigationRoot) -> Option<()> {
        self.rx
            .wait_for(|session| NavigationRoot::for_session(session) == root)
            .await
            .ok()
            .map(|_| ())
    }
}
