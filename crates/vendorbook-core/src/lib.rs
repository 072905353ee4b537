//! Client core for the vendorbook marketplace app.
//!
//! The pieces, leaf first:
//!
//! - [`auth::TokenStore`]: durable home of the bearer token
//! - [`auth::SessionClient`]: login, signup, logout, startup restore
//! - [`api::ApiClient`]: authenticated requests with normalized errors
//! - [`gate::SessionGate`]: which navigation root is active
//! - [`provider::SessionProvider`]: session access for the rest of the app

pub mod api;
pub mod auth;
pub mod config;
pub mod gate;
pub mod models;
pub mod provider;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthError, Session, SessionClient, SessionStatus, SignupForm};
pub use config::Config;
pub use gate::{NavigationRoot, SessionGate};
pub use provider::{try_use_session, use_session, SessionContext, SessionProvider};
