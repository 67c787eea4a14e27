//! Core library for the Echo social feed client.
//!
//! - `api`: request executor plus the auth and user endpoint groups
//! - `auth`: session store and its storage backends
//! - `forms`: client-side validation for registration, profile and avatar input
//! - `config`: backend URLs and storage selection
//! - `navigation`: the redirect seam used by logout and the login guard

pub mod api;
pub mod auth;
pub mod config;
pub mod forms;
pub mod models;
pub mod navigation;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, ApiError, AuthApi, RequestOptions, UserApi};
pub use auth::{Session, SessionStore};
pub use config::Config;
pub use navigation::{LogNavigator, Navigator, LOGIN_ROUTE};
