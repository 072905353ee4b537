//! HTTP client for the marketplace REST backend.
//!
//! Every call goes through [`ApiClient::execute`], which attaches the bearer
//! token of the current session, retries rate-limited requests, and turns
//! non-success responses into an [`ApiError`]. A 401 on a session-authenticated
//! call ends the session that issued it.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::SessionState;
use crate::models::User;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when neither the environment nor the config names one.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body for `POST /signup`.
#[derive(Clone, Serialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub cnic_number: String,
}

#[derive(Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Which credentials a request carries.
#[derive(Clone, Copy)]
enum Auth<'a> {
    /// No Authorization header.
    Anonymous,
    /// Token of the current session; a 401 invalidates that session.
    Session,
    /// An explicit token that is not (or no longer) the live session's.
    Token(&'a str),
}

/// API client for the marketplace backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    session: Arc<SessionState>,
    initial_backoff: Duration,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<SessionState>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            session,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the first rate-limit backoff delay.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn session_state(&self) -> &Arc<SessionState> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(token: Option<&str>) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(token) = token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidResponse("Token is not a valid header value".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(body)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<String>, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(Some(response.text().await?))
        } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let body = response.text().await.unwrap_or_default();
            debug!(%status, body = %ApiError::truncate_body(&body), "Request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Issue one request and return the raw success body.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        auth: Auth<'_>,
    ) -> Result<String, ApiError> {
        let url = self.url(path);
        let (token, epoch) = match auth {
            Auth::Anonymous => (None, None),
            Auth::Token(token) => (Some(token.to_string()), None),
            Auth::Session => {
                let (token, epoch) = self.session.credentials();
                (token, Some(epoch))
            }
        };

        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            debug!(%method, path, authenticated = token.is_some(), "API request");
            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(Self::auth_headers(token.as_deref())?);
            if let Some(body) = body {
                request = request.json(body);
            }

            let result = match request.send().await {
                Ok(response) => Self::check_response_for_retry(response).await,
                Err(e) => {
                    warn!(%method, path, error = %e, "Request did not complete");
                    Err(ApiError::Network(e))
                }
            };

            match result {
                Ok(Some(text)) => return Ok(text),
                Ok(None) => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(path, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2; // Exponential backoff
                }
                Err(err) => {
                    if err.is_session_invalid() && token.is_some() {
                        if let Some(epoch) = epoch {
                            self.session.invalidate(epoch);
                        }
                    }
                    return Err(err);
                }
            }
        }
    }

    fn parse<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, ApiError> {
        serde_json::from_str(text)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    fn encode<B: Serialize>(body: &B) -> Result<Value, ApiError> {
        serde_json::to_value(body)
            .map_err(|e| ApiError::Validation(format!("Could not encode request: {}", e)))
    }

    /// Accept either `{key: T}` or a bare `T`.
    pub(crate) fn unwrap_envelope<T: DeserializeOwned>(
        path: &str,
        value: Value,
        key: &str,
    ) -> Result<T, ApiError> {
        let inner = match value {
            Value::Object(mut map) => match map.remove(key) {
                Some(inner) => inner,
                None => Value::Object(map),
            },
            other => other,
        };
        serde_json::from_value(inner)
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", path, e)))
    }

    // ===== Authenticated helpers =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let text = self.execute(Method::GET, path, None, Auth::Session).await?;
        Self::parse(path, &text)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = Self::encode(body)?;
        let text = self
            .execute(Method::POST, path, Some(&body), Auth::Session)
            .await?;
        Self::parse(path, &text)
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = Self::encode(body)?;
        let text = self
            .execute(Method::PUT, path, Some(&body), Auth::Session)
            .await?;
        Self::parse(path, &text)
    }

    /// DELETE ignores the response body.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, None, Auth::Session)
            .await
            .map(|_| ())
    }

    // ===== Session endpoints =====

    /// Exchange credentials for a token and user record.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = Self::encode(&LoginRequest { email, password })?;
        let text = self
            .execute(Method::POST, "/login", Some(&body), Auth::Anonymous)
            .await?;
        let response: LoginResponse = Self::parse("/login", &text)?;
        if response.token.trim().is_empty() {
            return Err(ApiError::InvalidResponse("/login: empty token".to_string()));
        }
        Ok(response)
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, ApiError> {
        let body = Self::encode(request)?;
        let text = self
            .execute(Method::POST, "/signup", Some(&body), Auth::Anonymous)
            .await?;
        if text.trim().is_empty() {
            return Ok(SignupResponse::default());
        }
        Self::parse("/signup", &text)
    }

    /// Look up the user behind `token`, which need not belong to the live session.
    pub async fn current_user_with_token(&self, token: &str) -> Result<User, ApiError> {
        let text = self
            .execute(Method::GET, "/users/me", None, Auth::Token(token))
            .await?;
        Self::unwrap_envelope("/users/me", Self::parse("/users/me", &text)?, "user")
    }

    /// Tell the backend that `token` is no longer in use.
    pub async fn revoke(&self, token: &str) -> Result<(), ApiError> {
        self.execute(Method::POST, "/logout", None, Auth::Token(token))
            .await
            .map(|_| ())
    }
}
