//! Authentication endpoints (register, login) and local session checks.

use tracing::{error, info, warn};

use super::client::{ApiClient, RequestOptions};
use super::ApiError;
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserRecord};
use crate::navigation::LOGIN_ROUTE;

const REGISTER_ENDPOINT: &str = "/auth/register";
const LOGIN_ENDPOINT: &str = "/auth/login";

pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Create an account. Input is sent as-is; see `forms::RegisterForm` for
    /// client-side checks.
    #[tracing::instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let options = RequestOptions::post_json(request)?;
        let response: RegisterResponse = self.client.request_json(REGISTER_ENDPOINT, options).await?;
        info!("Registration accepted");
        Ok(response)
    }

    /// Sign in and persist the returned user and tokens.
    ///
    /// Any failure, whatever its cause, leaves the session empty.
    #[tracing::instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        match self.try_login(credentials).await {
            Ok(response) => Ok(response),
            Err(err) => {
                if let Err(e) = self.client.session().clear() {
                    warn!(error = %e, "Failed to clear session after login failure");
                }
                error!(error = %err, "Login failed");
                Err(err)
            }
        }
    }

    async fn try_login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let options = RequestOptions::post_json(credentials)?;
        let response: LoginResponse = self.client.request_json(LOGIN_ENDPOINT, options).await?;

        if let Some(user) = &response.user {
            let session = self.client.session();
            session.set_user(user)?;
            if let Some(token) = &response.access_token {
                session.set_access_token(token)?;
            }
            if let Some(token) = &response.refresh_token {
                session.set_refresh_token(token)?;
            }
            info!(user_id = user.id, "Login successful");
        } else {
            warn!("Login response carried no user; session not written");
        }

        Ok(response)
    }

    /// Forget the session and send the user to the login route.
    pub fn logout(&self) {
        if let Err(e) = self.client.session().clear() {
            warn!(error = %e, "Failed to clear session on logout");
        }
        info!("Logged out");
        self.client.navigator().redirect(LOGIN_ROUTE);
    }

    /// Local check only: both an access token and a user are stored.
    pub fn is_logged_in(&self) -> bool {
        self.client.session().is_logged_in()
    }

    /// Guard for operations that need a session.
    ///
    /// Returns the cached user, or redirects to the login route and fails.
    pub fn require_login(&self) -> Result<UserRecord, ApiError> {
        let session = self.client.session();
        if session.is_logged_in() {
            if let Some(user) = session.user()? {
                return Ok(user);
            }
        }
        self.client.navigator().redirect(LOGIN_ROUTE);
        Err(ApiError::NotLoggedIn)
    }
}
