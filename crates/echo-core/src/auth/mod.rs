//! Session state for the signed-in user.
//!
//! This module provides:
//! - `SessionStore`: access token, refresh token and cached user record
//! - `KeyValueStore` backends: `FileStore` (default), `KeyringStore` for the
//!   OS keychain, and `MemoryStore`
//!
//! Sessions have no client-side expiry. They end on logout or on the first
//! request the server rejects with 401.

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::KeyringStore;
pub use session::{Session, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
