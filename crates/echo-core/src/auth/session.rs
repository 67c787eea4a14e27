use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::storage::{KeyValueStore, MemoryStore};
use crate::models::UserRecord;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "user";

/// Snapshot of the persisted session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserRecord>,
}

impl Session {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.user.is_none()
    }
}

/// Session state persisted as three independent entries.
///
/// Clones share the same backend. The three entries are written one at a
/// time, so a reader may observe a partial session; `is_logged_in` requires
/// both the access token and the user.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn get(&self) -> Result<Session> {
        Ok(Session {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token()?,
            user: self.user()?,
        })
    }

    /// Replace the stored session. Absent fields are removed.
    pub fn set(&self, session: &Session) -> Result<()> {
        match &session.user {
            Some(user) => self.set_user(user)?,
            None => self.backend.remove_item(USER_KEY)?,
        }
        match &session.access_token {
            Some(token) => self.set_access_token(token)?,
            None => self.backend.remove_item(ACCESS_TOKEN_KEY)?,
        }
        match &session.refresh_token {
            Some(token) => self.set_refresh_token(token)?,
            None => self.backend.remove_item(REFRESH_TOKEN_KEY)?,
        }
        Ok(())
    }

    /// Remove all three entries. Safe to call on an empty store.
    pub fn clear(&self) -> Result<()> {
        // Attempt every key even if one fails
        let results = [
            self.backend.remove_item(ACCESS_TOKEN_KEY),
            self.backend.remove_item(REFRESH_TOKEN_KEY),
            self.backend.remove_item(USER_KEY),
        ];
        debug!("cleared session");
        results.into_iter().collect()
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        Ok(self.backend.get_item(ACCESS_TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.backend.get_item(REFRESH_TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// The cached user. An entry that no longer decodes reads as absent.
    pub fn user(&self) -> Result<Option<UserRecord>> {
        let Some(raw) = self.backend.get_item(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cached user");
                Ok(None)
            }
        }
    }

    pub fn set_user(&self, user: &UserRecord) -> Result<()> {
        let json = serde_json::to_string(user).context("Failed to serialize user")?;
        self.backend.set_item(USER_KEY, &json)
    }

    pub fn set_access_token(&self, token: &str) -> Result<()> {
        self.backend.set_item(ACCESS_TOKEN_KEY, token)
    }

    pub fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.backend.set_item(REFRESH_TOKEN_KEY, token)
    }

    /// Both an access token and a user are present. Never touches the network,
    /// so this says nothing about whether the server still accepts the token.
    pub fn is_logged_in(&self) -> bool {
        let has_token = matches!(self.access_token(), Ok(Some(_)));
        let has_user = matches!(self.user(), Ok(Some(_)));
        has_token && has_user
    }
}
