//! Authentication module for the client-side session lifecycle.
//!
//! This module provides:
//! - `TokenStore`: durable storage for the bearer token (file or OS keychain)
//! - `Session`, `SessionState`: the published session snapshot and its owner
//! - `SessionClient`: login, signup, logout and startup restore
//!
//! Sessions are restored at startup only if the backend still accepts the
//! stored token.

pub mod client;
pub mod error;
pub mod session;
pub mod store;

pub use client::{SessionClient, SignupForm, SignupReceipt, MIN_PASSWORD_LENGTH};
pub use error::AuthError;
pub use session::{Session, SessionState, SessionStatus, SESSION_EXPIRED_MESSAGE};
pub use store::{FileTokenStore, KeyringTokenStore, TokenStore, TOKEN_KEY};
