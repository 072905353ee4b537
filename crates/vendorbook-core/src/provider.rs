//! Hands the session to the rest of the application.
//!
//! A [`SessionProvider`] wraps the [`SessionClient`] and runs application code
//! inside [`SessionProvider::scope`]. Code in that scope reaches the session
//! through [`use_session`]; calling it anywhere else is a bug and panics.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::api::ApiClient;
use crate::auth::{AuthError, Session, SessionClient, SessionStatus, SignupForm, SignupReceipt};
use crate::gate::SessionGate;
use crate::models::User;

tokio::task_local! {
    static CURRENT: SessionContext;
}

/// Read/act surface over the session for code running in a provider scope.
#[derive(Clone)]
pub struct SessionContext {
    client: Arc<SessionClient>,
}

impl SessionContext {
    pub fn session(&self) -> Session {
        self.client.session()
    }

    pub fn user(&self) -> Option<User> {
        self.client.session().user().cloned()
    }

    pub fn status(&self) -> SessionStatus {
        self.client.status()
    }

    pub fn error(&self) -> Option<String> {
        self.client.session().last_error().map(str::to_string)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.client.login(email, password).await
    }

    pub async fn signup(&self, form: &SignupForm) -> Result<SignupReceipt, AuthError> {
        self.client.signup(form).await
    }

    pub async fn logout(&self) {
        self.client.logout().await
    }

    /// Gate with its own subscription, for code that follows navigation.
    pub fn gate(&self) -> SessionGate {
        SessionGate::new(self.client.subscribe())
    }

    pub fn api(&self) -> &ApiClient {
        self.client.api()
    }
}

pub struct SessionProvider {
    client: Arc<SessionClient>,
    rx: watch::Receiver<Session>,
}

impl SessionProvider {
    pub fn new(client: Arc<SessionClient>) -> Self {
        let rx = client.subscribe();
        debug!("Session provider subscribed");
        Self { client, rx }
    }

    pub fn context(&self) -> SessionContext {
        SessionContext {
            client: self.client.clone(),
        }
    }

    /// Run `fut` with this provider's context available to [`use_session`].
    pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
        CURRENT.scope(self.context(), fut).await
    }

    /// Wait for the next session change. `None` once the client is gone.
    pub async fn next_change(&mut self) -> Option<Session> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Tear down the provider, releasing its subscription.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        debug!("Session provider unsubscribed");
    }
}

/// The session context of the enclosing provider scope.
///
/// # Panics
///
/// Panics when called outside [`SessionProvider::scope`].
pub fn use_session() -> SessionContext {
    match try_use_session() {
        Some(ctx) => ctx,
        None => panic!("use_session() must be called within a SessionProvider scope"),
    }
}

/// Like [`use_session`], but returns `None` outside a provider scope.
pub fn try_use_session() -> Option<SessionContext> {
    CURRENT.try_with(|ctx| ctx.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::auth::FileTokenStore;

    fn client() -> (tempfile::TempDir, Arc<SessionClient>) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileTokenStore::new(dir.path()));
        let client = SessionClient::new(store, "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        (dir, Arc::new(client))
    }

    #[tokio::test]
    async fn test_use_session_inside_scope() {
        let (_dir, client) = client();
        let provider = SessionProvider::new(client);
        let status = provider.scope(async { use_session().status() }).await;
        assert_eq!(status, SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    #[should_panic(expected = "must be called within a SessionProvider scope")]
    async fn test_use_session_outside_scope_panics() {
        let _ = use_session();
    }

    #[test]
    fn test_try_use_session_outside_scope() {
        assert!(try_use_session().is_none());
    }

    #[tokio::test]
    async fn test_shutdown_releases_subscription_once() {
        let (_dir, client) = client();
        let before = client.subscriber_count();
        let provider = SessionProvider::new(client.clone());
        assert_eq!(client.subscriber_count(), before + 1);
        provider.shutdown();
        assert_eq!(client.subscriber_count(), before);
    }

    #[tokio::test]
    async fn test_next_change_sees_logout() {
        let (_dir, client) = client();
        let mut provider = SessionProvider::new(client.clone());
        client.logout().await;
        let session = provider.next_change().await.unwrap();
        assert_eq!(session.status(), SessionStatus::Unauthenticated);
    }
}
