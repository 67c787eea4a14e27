//! Route changes requested by the API layer.
//!
//! Logging out, or touching a protected operation without a session, sends
//! the user to the login route. How that happens depends on the front end,
//! so the API layer only calls [`Navigator::redirect`].

use tracing::info;

pub const LOGIN_ROUTE: &str = "/login";

pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

/// Records the redirect in the log and does nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, route: &str) {
        info!(route, "Redirect requested");
    }
}
