//! API routes

mod auth;
mod health;
mod shops;
mod types;
mod users;

use axum::Router;

use crate::state::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .merge(health::routes())
        // Login and token refresh
        .merge(auth::routes())
        // Directory API
        .merge(shops::routes())
        // Account management
        .merge(users::routes())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use shopdir_auth::{HashingParams, PasswordHasher, TokenService};
    use shopdir_db::{Database, NewUser, Role, User};
    use tower::ServiceExt;

    use crate::state::AppState;

    pub const TEST_SECRET: &str = "integration-test-signing-secret-0123456789";

    /// Fresh state over a throwaway database file. The returned path keeps
    /// the file alive until the test drops it.
    pub async fn test_state() -> (AppState, tempfile::TempPath) {
        test_state_with_ttls(900, 604_800).await
    }

    pub async fn test_state_with_ttls(
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> (AppState, tempfile::TempPath) {
        let path = tempfile::NamedTempFile::new().unwrap().into_temp_path();
        let url = format!("sqlite:{}?mode=rwc", path.display());
        let db = Database::new(&url).await.unwrap();
        let tokens = TokenService::new(TEST_SECRET, access_ttl_secs, refresh_ttl_secs).unwrap();
        // Cheap cost parameters keep the suite fast; stored hashes are
        // self-describing so verification does not depend on these.
        let hasher = PasswordHasher::new(HashingParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        (AppState::new(db, Arc::new(tokens), Arc::new(hasher)), path)
    }

    pub async fn seed_user(state: &AppState, username: &str, password: &str, role: Role) -> User {
        let password_hash = state.hasher.hash(password).unwrap();
        state
            .db
            .insert_user(NewUser {
                username: username.to_string(),
                password_hash,
                role,
            })
            .await
            .unwrap()
    }

    /// Send a request and decode the JSON response body
    pub async fn send_json(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
        auth_header: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        if let Some(value) = auth_header {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(json_body) => builder
                .body(Body::from(serde_json::to_string(&json_body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Send a request carrying a bearer token
    pub async fn authed_request(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: &str,
    ) -> (StatusCode, Value) {
        send_json(app, method, uri, body, Some(&format!("Bearer {}", token))).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use serde_json::json;
    use shopdir_db::Role;

    use super::create_router;
    use super::test_util::{authed_request, seed_user, send_json, test_state, test_state_with_ttls};

    #[tokio::test]
    async fn test_health_endpoints() {
        let (state, _path) = test_state().await;
        let app = create_router(state);

        for uri in ["/health", "/healthz"] {
            let (status, body) = send_json(&app, "GET", uri, None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
            assert!(body["version"].is_string());
        }
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (state, _path) = test_state().await;
        let app = create_router(state);

        // No Authorization header, still 200
        let (status, _) = send_json(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    /// Full session lifecycle: login as a regular member, get denied on an
    /// admin operation, succeed on a member operation, outlive the access
    /// token, then recover with the refresh token.
    #[tokio::test]
    async fn test_login_denial_expiry_refresh_flow() {
        // Access TTL short enough to wait out in a test
        let (state, _path) = test_state_with_ttls(2, 604_800).await;
        seed_user(&state, "alice", "password123", Role::User).await;
        let app = create_router(state);

        let (status, body) = send_json(
            &app,
            "POST",
            "/api/v1/auth/login",
            Some(json!({"username": "alice", "password": "password123"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["expires_in"], 2);
        let access = body["access_token"].as_str().unwrap().to_string();
        let refresh = body["refresh_token"].as_str().unwrap().to_string();

        // Admin-only operation is denied but authenticated
        let (status, resp) = authed_request(&app, "GET", "/api/v1/users", None, &access).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(resp["error"]["code"], "FORBIDDEN");

        // Operation open to members succeeds
        let (status, _) = authed_request(
            &app,
            "POST",
            "/api/v1/shops",
            Some(json!({"name": "Corner Cafe", "category": "cafe", "address": "1 Main Street"})),
            &access,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        // Wait out the access token
        tokio::time::sleep(Duration::from_millis(2200)).await;
        let (status, resp) = authed_request(&app, "GET", "/api/v1/shops", None, &access).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(resp["error"]["code"], "TOKEN_EXPIRED");

        // The refresh token is still good and yields a working access token
        let (status, body) = send_json(
            &app,
            "POST",
            "/api/v1/auth/refresh",
            Some(json!({"refresh_token": refresh})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let new_access = body["access_token"].as_str().unwrap();

        let (status, body) = authed_request(&app, "GET", "/api/v1/shops", None, new_access).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}
