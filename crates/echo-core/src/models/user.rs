use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Avatar shown when the backend has not assigned one.
pub const DEFAULT_AVATAR: &str = "/default-avatar.png";

/// The authenticated user's record as returned by `/auth/login` and `/auth/me`.
///
/// Owned by the backend. The session store caches a possibly-stale copy, so
/// fields the client does not know about are kept in `extra` and written back
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following_count: Option<u64>,
    /// ISO-8601 timestamp. Missing from the login payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    /// Nickname when set, otherwise the username
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }

    /// First character of the display name, used as an avatar placeholder
    pub fn initial(&self) -> Option<char> {
        self.display_name().chars().next()
    }

    pub fn bio_display(&self) -> &str {
        self.bio
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or("No bio yet")
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin.unwrap_or(false)
    }

    /// Resolve the avatar into an absolute URL.
    ///
    /// The backend stores either a full URL or a path relative to its asset
    /// host. No avatar at all falls back to [`DEFAULT_AVATAR`].
    pub fn avatar_url(&self, asset_base_url: &str) -> String {
        match self.avatar.as_deref().filter(|a| !a.is_empty()) {
            Some(avatar) if avatar.starts_with("http") => avatar.to_string(),
            Some(avatar) => format!(
                "{}/{}",
                asset_base_url.trim_end_matches('/'),
                avatar.trim_start_matches('/')
            ),
            None => DEFAULT_AVATAR.to_string(),
        }
    }

    /// Join date formatted as "Jan 05, 2024 14:30"
    pub fn joined_display(&self) -> String {
        match &self.created_at {
            Some(created) => {
                // The backend emits naive UTC timestamps, but accept RFC 3339 too
                if let Ok(dt) = NaiveDateTime::parse_from_str(created, "%Y-%m-%dT%H:%M:%S%.f") {
                    dt.format("%b %d, %Y %H:%M").to_string()
                } else if let Ok(dt) = DateTime::parse_from_rfc3339(created) {
                    dt.format("%b %d, %Y %H:%M").to_string()
                } else {
                    created.chars().take(16).collect()
                }
            }
            None => "Unknown".to_string(),
        }
    }
}
