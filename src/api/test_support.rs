//! Shared helpers for router-level tests

use std::sync::Arc;

use axum::{body::Body, http::Request, http::StatusCode, Router};
use serde_json::Value;
use tower::ServiceExt;

use crate::api::router::create_router_with_state;
use crate::api::state::AppState;
use crate::domain::account::{Account, DefaultPasswordPolicy};
use crate::infrastructure::account::{
    AccountService, AdminCreateRequest, Argon2Hasher, CreateAccountRequest,
    InMemoryAccountRepository,
};
use crate::infrastructure::auth::{JwtTokenService, TokenConfig};
use crate::infrastructure::media::{AvatarStore, LocalAvatarStore};

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-characters";

/// In-memory application wired for HTTP tests
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub media_root: std::path::PathBuf,
}

impl TestApp {
    pub fn new() -> Self {
        let media_root =
            std::env::temp_dir().join(format!("account-service-media-{}", uuid::Uuid::new_v4()));
        let avatar_store = Arc::new(LocalAvatarStore::new(&media_root));

        Self::with_avatar_store(media_root, avatar_store)
    }

    pub fn with_avatar_store(
        media_root: std::path::PathBuf,
        avatar_store: Arc<dyn AvatarStore>,
    ) -> Self {
        let account_service = AccountService::new(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(Argon2Hasher::new()),
            Arc::new(DefaultPasswordPolicy::new()),
        );

        let state = AppState {
            account_service: Arc::new(account_service),
            token_service: Arc::new(JwtTokenService::new(TokenConfig::new(TEST_SECRET))),
            avatar_store,
            database: None,
        };

        let router = create_router_with_state(state.clone(), &media_root);

        Self {
            state,
            router,
            media_root,
        }
    }

    pub async fn create_account(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Account {
        self.state
            .account_service
            .admin_create(AdminCreateRequest {
                username: username.to_string(),
                email: email.map(String::from),
                password1: Some(password.to_string()),
                password2: Some(password.to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    pub async fn create_staff(&self, username: &str) -> Account {
        self.state
            .account_service
            .create_superuser(CreateAccountRequest::new(username, "Str0ng!pass"))
            .await
            .unwrap()
    }

    pub fn access_token(&self, account: &Account) -> String {
        self.state.token_service.issue_access(account).unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_root);
    }
}

/// Send a JSON request and decode the JSON response (Null when empty)
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}
