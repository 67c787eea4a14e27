use serde_json::Value;
use thiserror::Error;

use crate::forms::ValidationErrors;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status other than 401.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        data: Value,
    },

    /// The server answered 401. The session has already been cleared.
    #[error("{message}")]
    Unauthorized { message: String, data: Value },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Session storage error: {0:#}")]
    Storage(anyhow::Error),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Another error re-raised with a friendlier message.
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: Box<ApiError>,
    },
}

/// Maximum length for response bodies echoed into log lines
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Storage(err)
    }
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

    /// Build the error for a non-2xx response from its parsed payload.
    ///
    /// The payload's `message` wins; otherwise `fallback` is used, or a
    /// generic message naming the status.
    pub fn from_status(status: reqwest::StatusCode, data: Value, fallback: Option<&str>) -> Self {
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        match status.as_u16() {
            401 => ApiError::Unauthorized {
                message: message
                    .or_else(|| fallback.map(str::to_string))
                    .unwrap_or_else(|| "Unauthorized".to_string()),
                data,
            },
            code => ApiError::Http {
                status: code,
                message: message
                    .or_else(|| fallback.map(str::to_string))
                    .unwrap_or_else(|| format!("Request failed: {}", code)),
                data,
            },
        }
    }

    /// Re-raise with a different message, keeping the original as the source.
    pub fn context(self, message: impl Into<String>) -> Self {
        ApiError::Context {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// HTTP status of the underlying response, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::Context { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Raw payload of the failed response
    pub fn data(&self) -> Option<&Value> {
        match self {
            ApiError::Http { data, .. } | ApiError::Unauthorized { data, .. } => Some(data),
            ApiError::Context { source, .. } => source.data(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
