//! Session actions: login, signup, logout and startup restore.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::error::AuthError;
use super::session::{PendingAction, Session, SessionState, SessionStatus, SESSION_EXPIRED_MESSAGE};
use super::store::TokenStore;
use crate::api::{ApiClient, ApiError, SignupRequest};
use crate::config::Config;
use crate::models::User;

/// Shortest password accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 6;

const LOGIN_REQUIRED_MESSAGE: &str = "Please enter your email and password";
const SIGNUP_REQUIRED_MESSAGE: &str = "Please fill in all fields";
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
const SIGNUP_FAILED_MESSAGE: &str = "Signup failed";

/// Registration form as typed by the user.
#[derive(Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub cnic_number: String,
    pub email: String,
    pub password: String,
}

impl SignupForm {
    /// Check the form locally and build the request body.
    pub fn validate(&self) -> Result<SignupRequest, AuthError> {
        let name = self.name.trim();
        let cnic_number = self.cnic_number.trim();
        let email = self.email.trim();
        if name.is_empty() || cnic_number.is_empty() || email.is_empty() || self.password.is_empty() {
            return Err(AuthError::Validation(SIGNUP_REQUIRED_MESSAGE.to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )));
        }
        Ok(SignupRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            cnic_number: cnic_number.to_string(),
        })
    }
}

/// What the backend said about a successful registration.
#[derive(Debug, Clone)]
pub struct SignupReceipt {
    pub user: Option<User>,
    pub message: Option<String>,
}

/// Owns the session and performs every action that changes it.
///
/// Login, signup and restore are serialized: while one is in flight the
/// others fail fast with [`AuthError::Busy`]. Logout is never blocked and
/// always wins over an outstanding sign-in.
pub struct SessionClient {
    state: Arc<SessionState>,
    api: ApiClient,
    action: Mutex<()>,
}

impl SessionClient {
    pub fn new(
        store: Arc<dyn TokenStore>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let state = Arc::new(SessionState::new(store));
        let api = ApiClient::new(base_url, timeout, state.clone())?;
        Ok(Self::with_api(api))
    }

    /// Build from an existing API client, sharing its session state.
    pub fn with_api(api: ApiClient) -> Self {
        Self {
            state: api.session_state().clone(),
            api,
            action: Mutex::new(()),
        }
    }

    /// Build from the user's configuration: base URL, timeout and token store.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = config.open_token_store()?;
        let base_url = config.api_base_url();
        debug!(%base_url, storage = ?config.token_storage, "Creating session client");
        Ok(Self::new(store, &base_url, config.request_timeout())?)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> Session {
        self.state.snapshot()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.snapshot().status()
    }

    /// Receive a new snapshot after every transition.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.subscriber_count()
    }

    fn start_action(&self) -> Result<tokio::sync::MutexGuard<'_, ()>, AuthError> {
        let guard = self.action.try_lock().map_err(|_| {
            debug!("Rejecting concurrent authentication request");
            AuthError::Busy
        })?;
        if self.state.snapshot().is_authenticated() {
            return Err(AuthError::AlreadyAuthenticated);
        }
        Ok(guard)
    }

    fn reject(&self, err: AuthError) -> AuthError {
        self.state.record_error(&err.to_string());
        err
    }

    /// Sign in and, on success, persist the token and publish the user.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let _guard = self.start_action()?;

        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(self.reject(AuthError::Validation(LOGIN_REQUIRED_MESSAGE.to_string())));
        }

        info!("Signing in");
        let pending = PendingAction::begin(&self.state);
        let outcome = match self.api.login(email, password).await {
            Ok(response) => {
                let user = response.user.clone();
                self.state
                    .complete_login(pending.epoch(), response.token, response.user, true)
                    .map(|()| user)
            }
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                let err = AuthError::from_api(&e, INVALID_CREDENTIALS_MESSAGE);
                self.state.fail(pending.epoch(), err.to_string());
                Err(err)
            }
        };
        pending.settle();
        outcome
    }

    /// Register a new account. The session stays signed out either way,
    /// since the account may still need verification.
    pub async fn signup(&self, form: &SignupForm) -> Result<SignupReceipt, AuthError> {
        let _guard = self.start_action()?;

        let request = form.validate().map_err(|err| self.reject(err))?;

        info!("Registering account");
        let pending = PendingAction::begin(&self.state);
        let outcome = match self.api.signup(&request).await {
            Ok(response) => {
                if response.token.is_some() {
                    debug!("Ignoring token issued at signup");
                }
                self.state.settle_unauthenticated(pending.epoch(), None, false);
                Ok(SignupReceipt {
                    user: response.user,
                    message: response.message,
                })
            }
            Err(e) => {
                warn!(error = %e, "Signup failed");
                let err = AuthError::from_api(&e, SIGNUP_FAILED_MESSAGE);
                self.state.fail(pending.epoch(), err.to_string());
                Err(err)
            }
        };
        pending.settle();
        outcome
    }

    /// Sign out locally, then tell the backend on a best-effort basis.
    pub async fn logout(&self) {
        let previous = self.state.reset();
        info!("Signed out");

        if let Some(token) = previous {
            if let Err(e) = self.api.revoke(&token).await {
                debug!(error = %e, "Server logout failed, local session already cleared");
            }
        }
    }

    /// Bring back the session persisted by a previous run, if the backend
    /// still accepts its token. Any failure clears the stored token.
    pub async fn restore_session(&self) -> Option<User> {
        let _guard = match self.start_action() {
            Ok(guard) => guard,
            Err(AuthError::AlreadyAuthenticated) => return self.state.snapshot().user().cloned(),
            Err(e) => {
                debug!(error = %e, "Skipping session restore");
                return None;
            }
        };

        let token = match self.state.stored_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No stored session");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Could not read stored token");
                return None;
            }
        };

        info!("Restoring stored session");
        let pending = PendingAction::begin(&self.state);
        let outcome = match self.api.current_user_with_token(&token).await {
            Ok(user) => match self
                .state
                .complete_login(pending.epoch(), token, user.clone(), false)
            {
                Ok(()) => Some(user),
                Err(e) => {
                    debug!(error = %e, "Restored session discarded");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Stored session rejected, clearing token");
                let message = e
                    .is_session_invalid()
                    .then(|| SESSION_EXPIRED_MESSAGE.to_string());
                self.state
                    .settle_unauthenticated(pending.epoch(), message, true);
                None
            }
        };
        pending.settle();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(password: &str) -> SignupForm {
        SignupForm {
            name: "Ushna".into(),
            cnic_number: "35202-1234567-1".into(),
            email: "ushna@example.com".into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_signup_validate_short_password() {
        let err = form("12345").validate().err().unwrap();
        assert_eq!(
            err,
            AuthError::Validation("Password must be at least 6 characters long".into())
        );
    }

    #[test]
    fn test_signup_validate_missing_fields() {
        let mut f = form("secret");
        f.cnic_number = "   ".into();
        let err = f.validate().err().unwrap();
        assert_eq!(err.to_string(), "Please fill in all fields");
    }

    #[test]
    fn test_signup_validate_trims_fields() {
        let mut f = form("secret");
        f.email = "  ushna@example.com ".into();
        let request = f.validate().ok().unwrap();
        assert_eq!(request.email, "ushna@example.com");
        assert_eq!(request.password, "secret");
    }

    #[tokio::test]
    async fn test_login_validation_does_not_touch_network() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(crate::auth::FileTokenStore::new(dir.path()));
        // Nothing listens on port 9; a network attempt would surface as Network.
        let client = SessionClient::new(store, "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();

        let err = client.login("  ", "secret").await.err().unwrap();
        assert_eq!(err, AuthError::Validation(LOGIN_REQUIRED_MESSAGE.into()));
        let session = client.session();
        assert_eq!(session.status(), SessionStatus::Error);
        assert_eq!(session.last_error(), Some(LOGIN_REQUIRED_MESSAGE));
    }
}
