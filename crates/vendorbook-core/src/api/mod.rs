//! REST API client module for the marketplace backend.
//!
//! This module provides the `ApiClient`, the single path by which requests
//! reach the backend. It injects the session's bearer token and normalizes
//! failures into `ApiError`.

pub mod client;
pub mod error;
mod menu;
mod profile;

pub use client::{ApiClient, LoginResponse, SignupRequest, SignupResponse, DEFAULT_API_BASE_URL};
pub use error::{ApiError, GENERIC_ERROR_MESSAGE};
