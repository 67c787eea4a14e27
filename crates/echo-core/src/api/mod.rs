//! REST API client module for the Echo backend.
//!
//! This module provides the `ApiClient` request executor plus the two
//! endpoint groups built on it:
//!
//! - `AuthApi` (`client.auth()`): register, login, logout, session checks
//! - `UserApi` (`client.user()`): current user, profile edits, avatar upload
//!
//! The API uses JWT bearer token authentication. Tokens come from
//! `/auth/login` and are kept in the `SessionStore`.

pub mod auth;
pub mod client;
pub mod error;
pub mod user;

pub use auth::AuthApi;
pub use client::{ApiClient, RequestOptions};
pub use error::ApiError;
pub use user::UserApi;
