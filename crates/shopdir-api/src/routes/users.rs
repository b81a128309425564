//! User management routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use shopdir_auth::{authorize, Operation};
use shopdir_db::{NewUser, Role};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{CreateUserRequest, UpdateUserRequest, UserResponse};

// ==================== Input Validation ====================

/// Minimum allowed username length
const MIN_USERNAME_LENGTH: usize = 3;
/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 50;
/// Maximum allowed password length
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate username format and length
fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.len() < MIN_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username must be at least {} characters long",
            MIN_USERNAME_LENGTH
        )));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    // Only allow ASCII alphanumerics, underscores, and hyphens
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(ApiError::BadRequest(
            "Username can only contain alphanumeric characters, underscores, and hyphens"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate password length
fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== User Routes ====================

/// GET /api/v1/users
async fn list_users(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    authorize(&user, Operation::UserList.required_roles())?;

    let users = state.db.list_users().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /api/v1/users
async fn create_user(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    authorize(&user, Operation::UserCreate.required_roles())?;

    validate_username(&request.username)?;
    validate_password(&request.password)?;

    let role = request
        .role
        .parse::<Role>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    // Reject duplicates before paying for the hash
    if state.db.user_exists_by_username(&request.username).await? {
        return Err(ApiError::Conflict(format!(
            "Username already taken: {}",
            request.username
        )));
    }

    debug!("Creating user: {}", request.username);

    let hasher = state.hasher.clone();
    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ApiError::Internal(format!("Hashing task failed: {}", e)))??;

    let created = state
        .db
        .insert_user(NewUser {
            username: request.username,
            password_hash,
            role,
        })
        .await?;

    info!("Created user: {}", created.username);

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET /api/v1/users/{id}
async fn get_user(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    authorize(&user, Operation::UserGet.required_roles())?;

    let found = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    Ok(Json(found.into()))
}

/// PUT /api/v1/users/{id}
async fn update_user(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    authorize(&user, Operation::UserUpdate.required_roles())?;

    debug!("Updating user: {}", id);

    if state.db.get_user_by_id(id).await?.is_none() {
        return Err(ApiError::NotFound(format!("User: {}", id)));
    }

    if let Some(role_str) = &request.role {
        let role = role_str
            .parse::<Role>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        state.db.update_user_role(id, role).await?;
    }

    if let Some(password) = request.password {
        validate_password(&password)?;
        let hasher = state.hasher.clone();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ApiError::Internal(format!("Hashing task failed: {}", e)))??;
        state.db.update_user_password(id, &password_hash).await?;
    }

    let updated = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    info!("Updated user: {}", updated.username);

    Ok(Json(updated.into()))
}

/// DELETE /api/v1/users/{id}
async fn delete_user(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    authorize(&user, Operation::UserDelete.required_roles())?;

    debug!("Deleting user: {}", id);

    let deleted = state.db.delete_user(id).await?;

    if deleted {
        info!("Deleted user: {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("User: {}", id)))
    }
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/users", get(list_users))
        .route("/api/v1/users", post(create_user))
        .route("/api/v1/users/{id}", get(get_user))
        .route("/api/v1/users/{id}", put(update_user))
        .route("/api/v1/users/{id}", delete(delete_user))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use shopdir_db::Role;

    use crate::routes::test_util::{authed_request, seed_user, test_state};

    #[tokio::test]
    async fn test_user_routes_are_admin_only() {
        let (state, _path) = test_state().await;
        let member = seed_user(&state, "alice", "password123", Role::User).await;
        let admin = seed_user(&state, "root", "password123", Role::Admin).await;
        let member_token = state
            .tokens
            .issue_access_token(member.id, &member.username, member.role)
            .unwrap();
        let admin_token = state
            .tokens
            .issue_access_token(admin.id, &admin.username, admin.role)
            .unwrap();
        let app = crate::routes::create_router(state);

        let (status, body) = authed_request(&app, "GET", "/api/v1/users", None, &member_token).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        let (status, body) = authed_request(&app, "GET", "/api/v1/users", None, &admin_token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_user_validation_and_conflict() {
        let (state, _path) = test_state().await;
        let admin = seed_user(&state, "root", "password123", Role::Admin).await;
        let token = state
            .tokens
            .issue_access_token(admin.id, &admin.username, admin.role)
            .unwrap();
        let app = crate::routes::create_router(state);

        let (status, body) = authed_request(
            &app,
            "POST",
            "/api/v1/users",
            Some(json!({"username": "bob", "password": "password123", "role": "user"})),
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "bob");
        assert_eq!(body["role"], "user");

        // Same username again
        let (status, body) = authed_request(
            &app,
            "POST",
            "/api/v1/users",
            Some(json!({"username": "bob", "password": "password456", "role": "user"})),
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");

        // Unknown role
        let (status, _) = authed_request(
            &app,
            "POST",
            "/api/v1/users",
            Some(json!({"username": "carol", "password": "password123", "role": "owner"})),
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Password below minimum length
        let (status, _) = authed_request(
            &app,
            "POST",
            "/api/v1/users",
            Some(json!({"username": "carol", "password": "short", "role": "user"})),
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_update_delete_user() {
        let (state, _path) = test_state().await;
        let admin = seed_user(&state, "root", "password123", Role::Admin).await;
        let target = seed_user(&state, "bob", "password123", Role::User).await;
        let token = state
            .tokens
            .issue_access_token(admin.id, &admin.username, admin.role)
            .unwrap();
        let app = crate::routes::create_router(state);

        let uri = format!("/api/v1/users/{}", target.id);

        let (status, body) = authed_request(&app, "GET", &uri, None, &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "bob");

        let (status, body) = authed_request(
            &app,
            "PUT",
            &uri,
            Some(json!({"role": "admin"})),
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");

        let (status, _) = authed_request(&app, "DELETE", &uri, None, &token).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = authed_request(&app, "GET", &uri, None, &token).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_password_update_changes_login() {
        let (state, _path) = test_state().await;
        let admin = seed_user(&state, "root", "password123", Role::Admin).await;
        let target = seed_user(&state, "bob", "old-password", Role::User).await;
        let token = state
            .tokens
            .issue_access_token(admin.id, &admin.username, admin.role)
            .unwrap();
        let app = crate::routes::create_router(state);

        let (status, _) = authed_request(
            &app,
            "PUT",
            &format!("/api/v1/users/{}", target.id),
            Some(json!({"password": "new-password"})),
            &token,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        use crate::routes::test_util::send_json;
        let (status, _) = send_json(
            &app,
            "POST",
            "/api/v1/auth/login",
            Some(json!({"username": "bob", "password": "old-password"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send_json(
            &app,
            "POST",
            "/api/v1/auth/login",
            Some(json!({"username": "bob", "password": "new-password"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
