//! Authentication extractor and login/refresh routes

use axum::{
    extract::{FromRef, FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    routing::post,
    Json, Router,
};
use shopdir_auth::{AuthError, AuthUser};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};

// ==================== Auth Extractor ====================

/// Extractor for the authenticated caller.
///
/// Every protected handler takes this as its first argument, so identity
/// is resolved exactly once per request and only here.
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingCredentials)?;

        // The scheme is exactly "Bearer " with a single space. Anything
        // else counts as missing credentials, not an invalid token.
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MissingCredentials)?;

        let claims = app_state.tokens.validate_access_token(token)?;
        let user = AuthUser::from_claims(&claims)?;

        debug!("Authenticated user: {} ({})", user.username, user.role);
        Ok(RequireAuth(user))
    }
}

// ==================== Input Validation ====================

/// Minimum allowed username length
const MIN_USERNAME_LENGTH: usize = 3;
/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 50;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;

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

// ==================== Auth Routes ====================

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // Validate input lengths to bound the work an attacker can request
    validate_username(&request.username)?;
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }

    debug!("Login attempt for user: {}", request.username);

    let user_result = state.db.get_user_by_username(&request.username).await?;

    // Always run verification so an unknown username costs the same as a
    // known one. The dummy is a well-formed hash that never matches.
    const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

    let (hash_to_verify, user) = match user_result {
        Some(u) => (u.password_hash.clone(), Some(u)),
        None => (DUMMY_HASH.to_string(), None),
    };

    let hasher = state.hasher.clone();
    let password = request.password;
    let password_valid =
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash_to_verify))
            .await
            .map_err(|e| ApiError::Internal(format!("Verification task failed: {}", e)))??;

    // Unknown username and wrong password are reported identically
    let user = match (user, password_valid) {
        (Some(u), true) => u,
        _ => return Err(AuthError::InvalidCredentials.into()),
    };

    let access_token = state.tokens.issue_access_token(user.id, &user.username, user.role)?;
    let refresh_token = state.tokens.issue_refresh_token(user.id)?;

    info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.access_ttl_secs(),
        user: user.into(),
    }))
}

/// POST /api/v1/auth/refresh
async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let claims = state.tokens.validate_refresh_token(&request.refresh_token)?;
    let user_id = claims.user_id()?;

    // Re-read the principal so deletions and role changes take effect on
    // the next access token, not only on full re-login.
    let user = state
        .db
        .get_user_by_id(user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    let access_token = state.tokens.issue_access_token(user.id, &user.username, user.role)?;

    debug!("Refreshed access token for user: {}", user.username);

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.access_ttl_secs(),
    }))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/refresh", post(refresh))
}
