use serde::Deserialize;
use thiserror::Error;

/// Message shown when the server gives no usable explanation.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{}", message_or_generic(.0))]
    BadRequest(Option<String>),

    #[error("{}", message_or_generic(.0))]
    Unauthorized(Option<String>),

    #[error("{}", message_or_generic(.0))]
    AccessDenied(Option<String>),

    #[error("{}", message_or_generic(.0))]
    NotFound(Option<String>),

    #[error("{}", message_or_generic(.0))]
    Conflict(Option<String>),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("{}", message_or_generic(.0))]
    ServerError(Option<String>),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Validation(String),
}

fn message_or_generic(message: &Option<String>) -> &str {
    message.as_deref().unwrap_or(GENERIC_ERROR_MESSAGE)
}

/// Maximum length for error response bodies in log lines
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull `message` (or `error`) out of a JSON error body.
    fn extract_message(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed
            .message
            .or(parsed.error)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::extract_message(body);
        match status.as_u16() {
            400 | 422 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::BadRequest(message),
        }
    }

    /// The explanation the server sent, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest(m)
            | ApiError::Unauthorized(m)
            | ApiError::AccessDenied(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m)
            | ApiError::ServerError(m) => m.as_deref(),
            _ => None,
        }
    }

    /// True when the bearer token was rejected and the session must end.
    pub fn is_session_invalid(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// True for failures where the server never produced a usable answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::InvalidResponse(_))
    }

    /// Text suitable for showing in a form or toast.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::Network(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            ApiError::InvalidResponse(_) => GENERIC_ERROR_MESSAGE.to_string(),
            ApiError::RateLimited => {
                "Server is busy. Please wait a moment and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_carries_server_message() {
        let err = ApiError::from_status(StatusCode::CONFLICT, r#"{"message":"Email already exists"}"#);
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(err.server_message(), Some("Email already exists"));
        assert_eq!(err.user_message(), "Email already exists");
    }

    #[test]
    fn test_from_status_accepts_error_field() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"error":"Invalid email"}"#);
        assert_eq!(err.to_string(), "Invalid email");
    }

    #[test]
    fn test_from_status_generic_fallback() {
        for body in ["", "<html>Bad Gateway</html>", r#"{"message":"  "}"#, r#"{"other":1}"#] {
            let err = ApiError::from_status(StatusCode::BAD_GATEWAY, body);
            assert!(matches!(err, ApiError::ServerError(None)), "body {body:?}");
            assert_eq!(err.to_string(), GENERIC_ERROR_MESSAGE);
        }
    }

    #[test]
    fn test_unauthorized_is_session_invalid() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "");
        assert!(err.is_session_invalid());
        assert!(!ApiError::from_status(StatusCode::FORBIDDEN, "").is_session_invalid());
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
    }

    #[test]
    fn test_truncate_body() {
        let short = "short body";
        assert_eq!(ApiError::truncate_body(short), short);

        let long = "é".repeat(400);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.contains("truncated, 800 total bytes"));
    }

    #[test]
    fn test_invalid_response_is_transport() {
        let err = ApiError::InvalidResponse("missing field `token`".into());
        assert!(err.is_transport());
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }
}
