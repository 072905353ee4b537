use thiserror::Error;

use crate::api::ApiError;

/// Failure of a session action. The display text is meant for the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Caught locally, no request was sent.
    #[error("{0}")]
    Validation(String),

    /// The backend refused the credentials or the registration.
    #[error("{0}")]
    Rejected(String),

    /// The backend could not be reached or answered with garbage.
    #[error("{0}")]
    Network(String),

    #[error("Another authentication request is already in progress")]
    Busy,

    #[error("Already signed in. Sign out first.")]
    AlreadyAuthenticated,

    #[error("Sign-in was cancelled by sign out")]
    Superseded,

    #[error("Failed to save session: {0}")]
    Storage(String),
}

impl AuthError {
    /// Map a request failure, using `fallback` when the server sent no message.
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        match err {
            ApiError::Validation(msg) => AuthError::Validation(msg.clone()),
            _ if err.is_transport() => AuthError::Network(err.user_message()),
            ApiError::RateLimited => AuthError::Network(err.user_message()),
            ApiError::ServerError(msg) => {
                AuthError::Network(msg.clone().unwrap_or_else(|| err.user_message()))
            }
            _ => AuthError::Rejected(
                err.server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| fallback.to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_api_prefers_server_message() {
        let api = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"message":"Wrong password"}"#);
        assert_eq!(
            AuthError::from_api(&api, "Invalid email or password"),
            AuthError::Rejected("Wrong password".into())
        );
    }

    #[test]
    fn test_from_api_falls_back() {
        let api = ApiError::from_status(StatusCode::BAD_REQUEST, "");
        assert_eq!(
            AuthError::from_api(&api, "Signup failed").to_string(),
            "Signup failed"
        );
    }

    #[test]
    fn test_from_api_rate_limit_is_network() {
        let api = ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(
            AuthError::from_api(&api, "Invalid email or password"),
            AuthError::Network(_)
        ));
    }

    #[test]
    fn test_from_api_transport_is_network() {
        let api = ApiError::InvalidResponse("expected value".into());
        assert!(matches!(
            AuthError::from_api(&api, "Signup failed"),
            AuthError::Network(_)
        ));
    }
}
