//! Endpoints for the signed-in user's own record.
//!
//! Successful reads and edits overwrite the cached user in the session, so
//! the cache follows the server's copy. Concurrent calls each write their
//! own result; whichever response settles last wins.

use reqwest::multipart::Form;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{error, info};

use super::client::{ApiClient, RequestOptions};
use super::ApiError;
use crate::forms::AvatarUpload;
use crate::models::{CurrentUserResponse, ProfileUpdate, ProfileUpdateResponse, UserRecord};

const CURRENT_USER_ENDPOINT: &str = "/auth/me";
const UPDATE_PROFILE_ENDPOINT: &str = "/auth/update-profile";
const UPLOAD_AVATAR_ENDPOINT: &str = "/auth/upload-avatar";

pub struct UserApi<'a> {
    client: &'a ApiClient,
}

impl<'a> UserApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Fetch the signed-in user and refresh the cached copy.
    ///
    /// Failures are re-raised with a user-facing message; the original status
    /// stays available through [`ApiError::status`].
    pub async fn get_current_user(&self) -> Result<CurrentUserResponse, ApiError> {
        let response: CurrentUserResponse = match self
            .client
            .request_json(CURRENT_USER_ENDPOINT, RequestOptions::get())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "Failed to fetch current user");
                return Err(current_user_error(err));
            }
        };

        self.client.session().set_user(&response.user)?;
        Ok(response)
    }

    /// Send a partial profile edit and cache the user the server returns.
    #[tracing::instrument(skip_all)]
    pub async fn update_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<ProfileUpdateResponse, ApiError> {
        let options = RequestOptions::put_json(update)?;
        let response: ProfileUpdateResponse = self
            .client
            .request_json(UPDATE_PROFILE_ENDPOINT, options)
            .await
            .inspect_err(|err| error!(error = %err, "Failed to update profile"))?;

        if let Some(user) = &response.user {
            self.client.session().set_user(user)?;
            info!(user_id = user.id, "Profile updated");
        }
        Ok(response)
    }

    /// Upload a new avatar as multipart form data.
    ///
    /// This bypasses the JSON executor. The cached user is left alone; call
    /// [`get_current_user`](Self::get_current_user) afterwards to pick up the
    /// new avatar URL, or use [`upload_avatar_and_refresh`](Self::upload_avatar_and_refresh).
    #[tracing::instrument(skip_all, fields(file = %upload.file_name(), bytes = upload.len()))]
    pub async fn upload_avatar(&self, upload: AvatarUpload) -> Result<Value, ApiError> {
        let form = Form::new().part("avatar", upload.into_part()?);

        let mut builder = self
            .client
            .http()
            .post(self.client.url(UPLOAD_AVATAR_ENDPOINT))
            .multipart(form);
        if let Some(token) = self.client.session().access_token()? {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .inspect_err(|e| error!(error = %e, "Avatar upload failed"))?;

        let (status, payload) = ApiClient::read_payload(response).await;
        if status.is_success() {
            info!("Avatar uploaded");
            return Ok(payload);
        }

        if status == StatusCode::UNAUTHORIZED {
            self.client.invalidate_session();
        }

        let err = ApiError::from_status(status, payload, Some("Upload failed"));
        error!(status = status.as_u16(), error = %err, "Avatar upload failed");
        Err(err)
    }

    /// Upload, then re-fetch the user so the session holds the server's copy
    /// with the new avatar.
    pub async fn upload_avatar_and_refresh(
        &self,
        upload: AvatarUpload,
    ) -> Result<UserRecord, ApiError> {
        self.upload_avatar(upload).await?;
        let refreshed = self.get_current_user().await?;
        Ok(refreshed.user)
    }
}

fn current_user_error(err: ApiError) -> ApiError {
    match err.status() {
        Some(401) => err.context("Unauthorized access, please log in"),
        Some(404) => err.context("User not found"),
        _ => {
            let message = format!("Failed to fetch user info: {}", err);
            err.context(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Bytes;
    use axum::http::{header, HeaderMap, StatusCode as AxumStatus};
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::auth::SessionStore;
    use crate::test_support::{spawn_backend, test_user, TEST_TOKEN};

    fn logged_in_session() -> SessionStore {
        let session = SessionStore::in_memory();
        session.set_user(&test_user(1, "alice")).unwrap();
        session.set_access_token(TEST_TOKEN).unwrap();
        session
    }

    fn status_backend(path: &'static str, status: AxumStatus, body: Value) -> Router {
        Router::new().route(
            path,
            get(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        )
    }

    fn png_upload() -> AvatarUpload {
        AvatarUpload::new("me.png", "image/png", b"\x89PNG fake".to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_get_current_user_refreshes_cache() {
        let mut fresh = test_user(1, "alice");
        fresh.followers_count = Some(12);
        let app = status_backend(
            "/api/auth/me",
            AxumStatus::OK,
            json!({"status": "success", "user": fresh.clone()}),
        );
        let base_url = spawn_backend(app).await;

        let session = logged_in_session();
        let client = ApiClient::new(base_url, session.clone()).unwrap();
        let response = client.user().get_current_user().await.unwrap();

        assert_eq!(response.user, fresh);
        assert_eq!(session.user().unwrap(), Some(fresh));
    }

    #[tokio::test]
    async fn test_get_current_user_unauthorized() {
        let app = status_backend(
            "/api/auth/me",
            AxumStatus::UNAUTHORIZED,
            json!({"message": "Token has expired"}),
        );
        let base_url = spawn_backend(app).await;

        let session = logged_in_session();
        let client = ApiClient::new(base_url, session.clone()).unwrap();
        let err = client.user().get_current_user().await.unwrap_err();

        assert_eq!(err.to_string(), "Unauthorized access, please log in");
        assert!(err.is_unauthorized());
        assert!(session.get().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_current_user_not_found() {
        let app = status_backend(
            "/api/auth/me",
            AxumStatus::NOT_FOUND,
            json!({"status": "error", "message": "User not found"}),
        );
        let base_url = spawn_backend(app).await;

        let session = logged_in_session();
        let client = ApiClient::new(base_url, session.clone()).unwrap();
        let err = client.user().get_current_user().await.unwrap_err();

        assert_eq!(err.to_string(), "User not found");
        assert_eq!(err.status(), Some(404));
        // Only 401 invalidates
        assert!(session.is_logged_in());
    }

    #[tokio::test]
    async fn test_get_current_user_other_failure_is_wrapped() {
        let app = status_backend(
            "/api/auth/me",
            AxumStatus::INTERNAL_SERVER_ERROR,
            json!({"status": "error", "message": "Server error: boom"}),
        );
        let base_url = spawn_backend(app).await;

        let client = ApiClient::new(base_url, logged_in_session()).unwrap();
        let err = client.user().get_current_user().await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to fetch user info: Server error: boom");
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_last_settled_wins() {
        // Whichever request arrives first is answered last
        let arrivals = Arc::new(AtomicUsize::new(0));
        let app = Router::new().route(
            "/api/auth/me",
            get(move || {
                let arrivals = arrivals.clone();
                async move {
                    if arrivals.fetch_add(1, Ordering::SeqCst) == 0 {
                        tokio::time::sleep(Duration::from_millis(300)).await;
                        Json(json!({"user": test_user(1, "slow")}))
                    } else {
                        Json(json!({"user": test_user(1, "fast")}))
                    }
                }
            }),
        );
        let base_url = spawn_backend(app).await;

        let session = logged_in_session();
        let client = ApiClient::new(base_url, session.clone()).unwrap();
        let user_api = client.user();
        let (first, second) =
            futures::future::join(user_api.get_current_user(), user_api.get_current_user()).await;

        let mut names = vec![first.unwrap().user.username, second.unwrap().user.username];
        names.sort();
        assert_eq!(names, vec!["fast".to_string(), "slow".to_string()]);
        assert_eq!(session.user().unwrap().map(|u| u.username).as_deref(), Some("slow"));
    }

    #[tokio::test]
    async fn test_update_profile_syncs_cached_user() {
        let app = Router::new().route(
            "/api/auth/update-profile",
            put(|headers: HeaderMap, Json(req): Json<Value>| async move {
                assert_eq!(req, json!({"bio": "hi"}));
                assert_eq!(
                    headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
                    Some("Bearer at_test")
                );
                let mut user = test_user(1, "alice");
                user.bio = Some("hi".into());
                Json(json!({"status": "success", "message": "Profile updated", "user": user}))
            }),
        );
        let base_url = spawn_backend(app).await;

        let session = logged_in_session();
        let client = ApiClient::new(base_url, session.clone()).unwrap();
        let update = ProfileUpdate {
            bio: Some("hi".into()),
            ..Default::default()
        };
        let response = client.user().update_profile(&update).await.unwrap();

        assert_eq!(response.message.as_deref(), Some("Profile updated"));
        let cached = session.user().unwrap().unwrap();
        assert_eq!(cached.bio.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_update_profile_without_user_keeps_cache() {
        let app = Router::new().route(
            "/api/auth/update-profile",
            put(|| async { Json(json!({"message": "Nothing to update"})) }),
        );
        let base_url = spawn_backend(app).await;

        let session = logged_in_session();
        let client = ApiClient::new(base_url, session.clone()).unwrap();
        client.user().update_profile(&ProfileUpdate::default()).await.unwrap();

        assert_eq!(session.user().unwrap(), Some(test_user(1, "alice")));
    }

    #[tokio::test]
    async fn test_upload_avatar_sends_multipart_with_bearer() {
        let app = Router::new().route(
            "/api/auth/upload-avatar",
            post(|headers: HeaderMap, body: Bytes| async move {
                let content_type = headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let authorization = headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let body = String::from_utf8_lossy(&body).to_string();
                Json(json!({
                    "content_type": content_type,
                    "authorization": authorization,
                    "has_part": body.contains(r#"name="avatar""#),
                    "has_file": body.contains(r#"filename="me.png""#),
                    "avatar": "/static/avatars/1.png",
                }))
            }),
        );
        let base_url = spawn_backend(app).await;

        let session = logged_in_session();
        let client = ApiClient::new(base_url, session.clone()).unwrap();
        let result = client.user().upload_avatar(png_upload()).await.unwrap();

        assert!(result["content_type"]
            .as_str()
            .unwrap()
            .starts_with("multipart/form-data"));
        assert_eq!(result["authorization"], "Bearer at_test");
        assert_eq!(result["has_part"], true);
        assert_eq!(result["has_file"], true);
        // The upload itself does not touch the cached user
        assert_eq!(session.user().unwrap().unwrap().avatar, None);
    }

    #[tokio::test]
    async fn test_upload_avatar_failure() {
        let app = Router::new().route(
            "/api/auth/upload-avatar",
            post(|| async { (AxumStatus::BAD_REQUEST, Json(json!({"status": "error"}))) }),
        );
        let base_url = spawn_backend(app).await;

        let session = logged_in_session();
        let client = ApiClient::new(base_url, session.clone()).unwrap();
        let err = client.user().upload_avatar(png_upload()).await.unwrap_err();

        assert_eq!(err.to_string(), "Upload failed");
        assert_eq!(err.status(), Some(400));
        assert!(session.is_logged_in());
    }

    #[tokio::test]
    async fn test_upload_avatar_unauthorized_clears_session() {
        let app = Router::new().route(
            "/api/auth/upload-avatar",
            post(|| async {
                (AxumStatus::UNAUTHORIZED, Json(json!({"message": "Token has expired"})))
            }),
        );
        let base_url = spawn_backend(app).await;

        let session = logged_in_session();
        let client = ApiClient::new(base_url, session.clone()).unwrap();
        let err = client.user().upload_avatar(png_upload()).await.unwrap_err();

        assert!(err.is_unauthorized());
        assert!(session.get().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_and_refresh_updates_cached_avatar() {
        let app = Router::new()
            .route(
                "/api/auth/upload-avatar",
                post(|| async { Json(json!({"status": "success", "message": "Avatar uploaded"})) }),
            )
            .route(
                "/api/auth/me",
                get(|| async {
                    let mut user = test_user(1, "alice");
                    user.avatar = Some("/static/avatars/1.png".into());
                    Json(json!({"user": user}))
                }),
            );
        let base_url = spawn_backend(app).await;

        let session = logged_in_session();
        let client = ApiClient::new(base_url, session.clone()).unwrap();
        let user = client.user().upload_avatar_and_refresh(png_upload()).await.unwrap();

        assert_eq!(user.avatar.as_deref(), Some("/static/avatars/1.png"));
        assert_eq!(
            session.user().unwrap().and_then(|u| u.avatar).as_deref(),
            Some("/static/avatars/1.png")
        );
    }
}
