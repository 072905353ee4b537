use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::AuthError;
use super::store::TokenStore;
use crate::models::User;

/// Shown after the backend rejects the token of a live session.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Error,
}

/// Immutable snapshot of the client's authentication state.
///
/// Snapshots are only built through the constructors below, so a session is
/// `Authenticated` exactly when it carries both a token and a user.
#[derive(Clone, PartialEq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
    status: SessionStatus,
    last_error: Option<String>,
    authenticated_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn unauthenticated() -> Self {
        Self {
            token: None,
            user: None,
            status: SessionStatus::Unauthenticated,
            last_error: None,
            authenticated_at: None,
        }
    }

    fn authenticating() -> Self {
        Self {
            status: SessionStatus::Authenticating,
            ..Self::unauthenticated()
        }
    }

    fn authenticated(token: String, user: User) -> Self {
        Self {
            token: Some(token),
            user: Some(user),
            status: SessionStatus::Authenticated,
            last_error: None,
            authenticated_at: Some(Utc::now()),
        }
    }

    fn failed(message: String) -> Self {
        Self {
            status: SessionStatus::Error,
            last_error: Some(message),
            ..Self::unauthenticated()
        }
    }

    fn signed_out(message: Option<String>) -> Self {
        Self {
            last_error: message,
            ..Self::unauthenticated()
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn authenticated_at(&self) -> Option<DateTime<Utc>> {
        self.authenticated_at
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::unauthenticated()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .field("status", &self.status)
            .field("last_error", &self.last_error)
            .field("authenticated_at", &self.authenticated_at)
            .finish()
    }
}

/// The one mutable home of the session.
///
/// Every transition happens under the epoch lock: the token store is written
/// first, then the new snapshot is published on the watch channel. Each
/// transition bumps the epoch, so work started under an older epoch can
/// tell that it has been overtaken.
pub struct SessionState {
    store: Arc<dyn TokenStore>,
    tx: watch::Sender<Session>,
    epoch: Mutex<u64>,
}

impl SessionState {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (tx, _rx) = watch::channel(Session::unauthenticated());
        Self {
            store,
            tx,
            epoch: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Number of live subscriptions to session changes.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, session: Session) {
        let previous = self.tx.send_replace(session);
        let current = self.tx.borrow();
        if previous.status != current.status {
            debug!(from = ?previous.status, to = ?current.status, "Session transition");
        }
    }

    pub(crate) fn stored_token(&self) -> anyhow::Result<Option<String>> {
        self.store.get()
    }

    /// Current token (if any) together with the epoch it belongs to.
    pub(crate) fn credentials(&self) -> (Option<String>, u64) {
        let epoch = self.lock();
        (self.tx.borrow().token.clone(), *epoch)
    }

    /// Enter `Authenticating`, clearing the previous error.
    pub(crate) fn begin(&self) -> u64 {
        let mut epoch = self.lock();
        *epoch += 1;
        self.publish(Session::authenticating());
        *epoch
    }

    /// Record a locally detected failure without starting an action.
    pub(crate) fn record_error(&self, message: &str) {
        let _epoch = self.lock();
        let current = self.tx.borrow().clone();
        let next = match current.status {
            SessionStatus::Authenticated | SessionStatus::Authenticating => Session {
                last_error: Some(message.to_string()),
                ..current
            },
            _ => Session::failed(message.to_string()),
        };
        self.publish(next);
    }

    /// Finish a sign-in started at `started`.
    ///
    /// The token is persisted before the authenticated snapshot is published.
    pub(crate) fn complete_login(
        &self,
        started: u64,
        token: String,
        user: User,
        persist: bool,
    ) -> Result<(), AuthError> {
        let mut epoch = self.lock();
        if *epoch != started {
            debug!(started, current = *epoch, "Discarding superseded sign-in");
            return Err(AuthError::Superseded);
        }

        if persist {
            if let Err(e) = self.store.set(&token) {
                warn!(error = %e, "Failed to persist token");
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "Failed to clear token after persist failure");
                }
                *epoch += 1;
                let err = AuthError::Storage(e.to_string());
                self.publish(Session::failed(err.to_string()));
                return Err(err);
            }
        }

        *epoch += 1;
        info!(user_id = %user.id, "Session authenticated");
        self.publish(Session::authenticated(token, user));
        Ok(())
    }

    /// End an action started at `started` in `Error` with `message`.
    pub(crate) fn fail(&self, started: u64, message: String) -> bool {
        let mut epoch = self.lock();
        if *epoch != started {
            return false;
        }
        *epoch += 1;
        self.publish(Session::failed(message));
        true
    }

    /// End an action started at `started` back in `Unauthenticated`.
    pub(crate) fn settle_unauthenticated(
        &self,
        started: u64,
        message: Option<String>,
        clear_store: bool,
    ) -> bool {
        let mut epoch = self.lock();
        if *epoch != started {
            return false;
        }
        if clear_store {
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "Failed to clear stored token");
            }
        }
        *epoch += 1;
        self.publish(Session::signed_out(message));
        true
    }

    /// Unconditional local sign-out. Returns the token that was active.
    ///
    /// Store failures are logged; the in-memory reset always happens.
    pub(crate) fn reset(&self) -> Option<String> {
        let mut epoch = self.lock();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored token during logout");
        }
        *epoch += 1;
        let previous = self.tx.borrow().token.clone();
        self.publish(Session::signed_out(None));
        previous
    }

    /// Forced sign-out after the backend rejected the token issued at `issued`.
    pub(crate) fn invalidate(&self, issued: u64) -> bool {
        let mut epoch = self.lock();
        if *epoch != issued || self.tx.borrow().status != SessionStatus::Authenticated {
            return false;
        }
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear rejected token");
        }
        *epoch += 1;
        warn!("Token rejected by server, session invalidated");
        self.publish(Session::signed_out(Some(SESSION_EXPIRED_MESSAGE.to_string())));
        true
    }

    /// Swap in a fresher copy of the signed-in user, keeping the token.
    pub(crate) fn replace_user(&self, issued: u64, user: User) -> bool {
        let epoch = self.lock();
        let current = self.tx.borrow().clone();
        if *epoch != issued || current.status != SessionStatus::Authenticated {
            return false;
        }
        if current.user.as_ref().map(|u| u.id.as_str()) != Some(user.id.as_str()) {
            return false;
        }
        self.publish(Session {
            user: Some(user),
            ..current
        });
        true
    }
}

/// Settles a pending action if its future is dropped before it finishes.
pub(crate) struct PendingAction<'a> {
    state: &'a SessionState,
    epoch: u64,
    settled: bool,
}

impl<'a> PendingAction<'a> {
    pub(crate) fn begin(state: &'a SessionState) -> Self {
        let epoch = state.begin();
        Self {
            state,
            epoch,
            settled: false,
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for PendingAction<'_> {
    fn drop(&mut self) {
        if !self.settled && self.state.settle_unauthenticated(self.epoch, None, false) {
            warn!("Authentication request cancelled before completion");
        }
    }
}
