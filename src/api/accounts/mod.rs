//! Account self-service endpoints
//!
//! Every route acts on the account the access token was issued for.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    routing::{get, post, put},
    Router,
};
use tracing::{debug, info, warn};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{
    AccountResponse, ApiError, ChangePasswordBody, DetailResponse, Json, ProfileUpdateBody,
};
use crate::domain::DomainError;
use crate::infrastructure::media::avatar_extension;

/// Multipart framing allowance on top of the image itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the self-service router
pub fn create_accounts_router(max_avatar_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).patch(update_me))
        .route("/me/password", post(change_password))
        .route(
            "/me/avatar",
            put(upload_avatar).layer(DefaultBodyLimit::max(
                max_avatar_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
}

/// GET /accounts/me
pub async fn get_me(RequireUser(account): RequireUser) -> Json<AccountResponse> {
    Json(AccountResponse::from(&account))
}

/// Update the caller's profile
///
/// PATCH /accounts/me
///
/// Role and status flags are not editable here and are ignored if sent.
pub async fn update_me(
    State(state): State<AppState>,
    RequireUser(account): RequireUser,
    Json(body): Json<ProfileUpdateBody>,
) -> Result<Json<AccountResponse>, ApiError> {
    let updated = state
        .account_service
        .update_profile(&account.id().to_string(), body.into())
        .await?;

    debug!(user_id = %updated.id(), "Profile updated");
    Ok(Json(AccountResponse::from(&updated)))
}

/// POST /accounts/me/password
pub async fn change_password(
    State(state): State<AppState>,
    RequireUser(account): RequireUser,
    Json(body): Json<ChangePasswordBody>,
) -> Result<Json<DetailResponse>, ApiError> {
    state
        .account_service
        .change_password(&account.id().to_string(), body.into())
        .await?;

    info!(user_id = %account.id(), "Password changed");
    Ok(Json(DetailResponse::new("Password updated successfully.")))
}

/// Replace the caller's avatar image
///
/// PUT /accounts/me/avatar (multipart, field `avatar`)
pub async fn upload_avatar(
    State(state): State<AppState>,
    RequireUser(account): RequireUser,
    mut multipart: Multipart,
) -> Result<Json<AccountResponse>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("avatar") {
            continue;
        }

        let extension = avatar_extension(field.file_name(), field.content_type())?;
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((extension, bytes));
        break;
    }

    let Some((extension, bytes)) = upload else {
        return Err(DomainError::field("avatar", "No file was submitted.").into());
    };

    let path = state
        .avatar_store
        .save(account.id(), &extension, &bytes)
        .await?;

    let updated = state
        .account_service
        .set_avatar(&account.id().to_string(), Some(path.clone()))
        .await?;

    if let Some(previous) = account.avatar().filter(|previous| *previous != path) {
        if let Err(e) = state.avatar_store.remove(previous).await {
            warn!(user_id = %account.id(), error = %e, "Failed to remove previous avatar");
        }
    }

    info!(user_id = %account.id(), path = %path, "Avatar updated");
    Ok(Json(AccountResponse::from(&updated)))
}

fn multipart_error(err: MultipartError) -> ApiError {
    let mut error = ApiError::bad_request(err.body_text())
        .with_param("avatar")
        .with_code("invalid");
    error.status = err.status();
    error
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request, http::StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::api::test_support::{send, TestApp};
    use crate::domain::DomainError;
    use crate::infrastructure::media::MockAvatarStore;

    fn multipart_request(token: &str, file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let boundary = "X-ACCOUNT-BOUNDARY";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("PUT")
            .uri("/accounts/me/avatar")
            .header("authorization", format!("Bearer {}", token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let app = TestApp::new();

        let (status, body) = send(&app.router, "GET", "/accounts/me", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "not_authenticated");
    }

    #[tokio::test]
    async fn test_me_returns_account_and_records_activity() {
        let app = TestApp::new();
        let account = app.create_account("ivy", "Str0ng!pass", None).await;
        let token = app.access_token(&account);

        let (status, body) = send(&app.router, "GET", "/accounts/me", Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "ivy");

        let stored = app
            .state
            .account_service
            .get(&account.id().to_string())
            .await
            .unwrap()
            .unwrap();
        assert!(stored.last_activity().is_some());
    }

    #[tokio::test]
    async fn test_me_rejects_refresh_token() {
        let app = TestApp::new();
        let account = app.create_account("jack", "Str0ng!pass", None).await;
        let pair = app.state.token_service.issue_pair(&account).unwrap();

        let (status, body) =
            send(&app.router, "GET", "/accounts/me", Some(&pair.refresh), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "token_not_valid");
    }

    #[tokio::test]
    async fn test_me_rejects_inactive_account() {
        let app = TestApp::new();
        let account = app.create_account("kate", "Str0ng!pass", None).await;
        let token = app.access_token(&account);
        app.state
            .account_service
            .deactivate(&account.id().to_string())
            .await
            .unwrap();

        let (status, body) = send(&app.router, "GET", "/accounts/me", Some(&token), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "user_inactive");
    }

    #[tokio::test]
    async fn test_patch_me_ignores_role() {
        let app = TestApp::new();
        let account = app
            .create_account("liam", "Str0ng!pass", Some("liam@example.com"))
            .await;
        let token = app.access_token(&account);

        let (status, body) = send(
            &app.router,
            "PATCH",
            "/accounts/me",
            Some(&token),
            Some(json!({
                "first_name": "Liam",
                "bio": "",
                "email": "Liam@NEW.example.com",
                "role": "admin"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["first_name"], "Liam");
        assert_eq!(body["full_name"], "Liam");
        assert_eq!(body["email"], "Liam@new.example.com");
        assert_eq!(body["role"], "software_engineer");
        assert!(body["bio"].is_null());
    }

    #[tokio::test]
    async fn test_change_password() {
        let app = TestApp::new();
        let account = app.create_account("mia", "Str0ng!pass", None).await;
        let token = app.access_token(&account);

        let (status, body) = send(
            &app.router,
            "POST",
            "/accounts/me/password",
            Some(&token),
            Some(json!({
                "current_password": "wrong",
                "new_password": "An0ther!secret",
                "new_password2": "An0ther!secret"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["param"], "current_password");

        let (status, _) = send(
            &app.router,
            "POST",
            "/accounts/me/password",
            Some(&token),
            Some(json!({
                "current_password": "Str0ng!pass",
                "new_password": "An0ther!secret",
                "new_password2": "An0ther!secret"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app.router,
            "POST",
            "/auth/token",
            None,
            Some(json!({"username": "mia", "password": "An0ther!secret"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_avatar() {
        let app = TestApp::new();
        let account = app.create_account("nora", "Str0ng!pass", None).await;
        let token = app.access_token(&account);

        let response = app
            .router
            .clone()
            .oneshot(multipart_request(&token, "me.PNG", "image/png", b"\x89PNG fake"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let expected = format!("avatars/user_{0}/avatar_{0}.png", account.id());
        let stored = app
            .state
            .account_service
            .get(&account.id().to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.avatar(), Some(expected.as_str()));
        assert!(app.media_root.join(&expected).exists());

        // Replacing with another type drops the old file
        let response = app
            .router
            .clone()
            .oneshot(multipart_request(&token, "me.jpg", "image/jpeg", b"jpeg"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!app.media_root.join(&expected).exists());
    }

    #[tokio::test]
    async fn test_upload_storage_failure_keeps_avatar() {
        let mut store = MockAvatarStore::new();
        store.expect_max_bytes().return_const(1024usize);
        store
            .expect_save()
            .returning(|_, _, _| Err(DomainError::storage("disk full")));
        store.expect_remove().never();

        let media_root = std::env::temp_dir().join(format!("avatar-mock-{}", uuid::Uuid::new_v4()));
        let app = TestApp::with_avatar_store(media_root, Arc::new(store));
        let account = app.create_account("pia", "Str0ng!pass", None).await;
        let token = app.access_token(&account);

        let response = app
            .router
            .clone()
            .oneshot(multipart_request(&token, "me.png", "image/png", b"png"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let stored = app
            .state
            .account_service
            .get(&account.id().to_string())
            .await
            .unwrap()
            .unwrap();
        assert!(stored.avatar().is_none());
    }

    #[tokio::test]
    async fn test_upload_rejects_non_image() {
        let app = TestApp::new();
        let account = app.create_account("otto", "Str0ng!pass", None).await;
        let token = app.access_token(&account);

        let response = app
            .router
            .clone()
            .oneshot(multipart_request(&token, "notes.txt", "text/plain", b"hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
