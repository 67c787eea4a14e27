//! Request executor for the Echo REST API.
//!
//! Every JSON call goes through [`ApiClient::request`], which attaches the
//! stored bearer token, parses the reply and turns non-2xx statuses into
//! [`ApiError`]. A 401 from any endpoint clears the stored session.

use std::sync::Arc;

use anyhow::Context;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::auth::AuthApi;
use super::user::UserApi;
use super::ApiError;
use crate::auth::SessionStore;
use crate::config::Config;
use crate::navigation::{LogNavigator, Navigator};

/// Message used when a response body is not JSON
const UNPARSEABLE_RESPONSE_MESSAGE: &str = "Unable to parse server response";

/// Method, extra headers and body for a single request.
///
/// Defaults to `GET` with no body. `Content-Type: application/json` is always
/// sent unless `headers` overrides it.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post_json<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        Self::with_json_body(Method::POST, body)
    }

    pub fn put_json<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        Self::with_json_body(Method::PUT, body)
    }

    fn with_json_body<B: Serialize + ?Sized>(method: Method, body: &B) -> Result<Self, ApiError> {
        let body = serde_json::to_string(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {}", e)))?;
        Ok(Self {
            method,
            body: Some(body),
            ..Self::default()
        })
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// API client for the Echo backend.
/// Clone is cheap - the HTTP client, session backend and navigator are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:5000/api`).
    ///
    /// No request timeout is configured; a hung request only blocks its caller.
    pub fn new(base_url: impl Into<String>, session: SessionStore) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            navigator: Arc::new(LogNavigator),
        })
    }

    /// Build a client from configuration, opening the configured session store
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let session = config.open_session_store()?;
        Self::new(config.api_base_url.clone(), session).context("Failed to build HTTP client")
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn user(&self) -> UserApi<'_> {
        UserApi::new(self)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    pub(crate) fn navigator(&self) -> &dyn Navigator {
        self.navigator.as_ref()
    }

    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Defaults, then caller headers, then the bearer token.
    fn build_headers(&self, caller: &HeaderMap) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.extend(caller.clone());

        if let Some(token) = self.session.access_token()? {
            headers.insert(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ApiError::InvalidRequest(format!("Invalid access token: {}", e)))?,
            );
        }
        Ok(headers)
    }

    /// Send a JSON request to `endpoint` and return the parsed payload.
    ///
    /// 2xx payloads are returned as-is, whatever their shape. Anything else
    /// becomes an [`ApiError`] carrying the status and raw payload; a 401 also
    /// clears the session before returning.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let url = self.url(endpoint);
        let headers = self.build_headers(&options.headers)?;

        debug!(method = %options.method, endpoint, "Sending API request");

        let mut builder = self.client.request(options.method, &url).headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(endpoint, error = %e, "API request error");
                return Err(e.into());
            }
        };

        let (status, payload) = Self::read_payload(response).await;
        if status.is_success() {
            return Ok(payload);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_session();
        }

        let err = ApiError::from_status(status, payload, None);
        error!(endpoint, status = status.as_u16(), error = %err, "API request error");
        Err(err)
    }

    /// [`request`](Self::request), then deserialize the payload into `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let payload = self.request(endpoint, options).await?;
        serde_json::from_value(payload).map_err(|e| {
            ApiError::InvalidResponse(format!("Unexpected response from {}: {}", endpoint, e))
        })
    }

    /// Status plus JSON body. A body that is not JSON is replaced by an
    /// error-shaped payload instead of failing.
    pub(crate) async fn read_payload(response: reqwest::Response) -> (StatusCode, Value) {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status = status.as_u16(), error = %e, "Failed to read response body");
                return (status, unparseable_payload());
            }
        };

        match serde_json::from_str(&body) {
            Ok(payload) => (status, payload),
            Err(_) => {
                debug!(
                    status = status.as_u16(),
                    body = %ApiError::truncate_body(&body),
                    "Response body is not JSON"
                );
                (status, unparseable_payload())
            }
        }
    }

    /// Drop the stored session after the server rejected our token.
    pub(crate) fn invalidate_session(&self) {
        match self.session.clear() {
            Ok(()) => warn!("Received 401, cleared stored session"),
            Err(e) => warn!(error = %e, "Received 401 but failed to clear stored session"),
        }
    }
}

fn unparseable_payload() -> Value {
    serde_json::json!({
        "status": "error",
        "message": UNPARSEABLE_RESPONSE_MESSAGE,
    })
}
