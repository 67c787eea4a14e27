//! Data models for Echo entities.
//!
//! - `UserRecord`: the authenticated user's profile
//! - Auth payloads: `LoginRequest`/`LoginResponse`, `RegisterRequest`,
//!   `CurrentUserResponse`, `ProfileUpdate`

pub mod auth;
pub mod user;

pub use auth::{
    CurrentUserResponse, LoginRequest, LoginResponse, ProfileUpdate, ProfileUpdateResponse,
    RegisterRequest, RegisterResponse,
};
pub use user::{UserRecord, DEFAULT_AVATAR};
