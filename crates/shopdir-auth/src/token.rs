//! Signed token issuance and validation
//!
//! Two token classes, both HS256 JWTs signed with one service-wide key:
//! short-lived access tokens carrying the identity used for request
//! checks, and long-lived refresh tokens carrying only the principal id.
//! Validation never trusts a claim before the signature has checked out,
//! and the token class is checked before expiry so an expired token of
//! the wrong class still reads as wrong-class.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use shopdir_db::Role;

use crate::error::AuthError;

/// Minimum signing key length, per HS256 key-size guidance
pub const MIN_SECRET_BYTES: usize = 32;

/// Token class carried in the claim set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims
///
/// Refresh tokens omit `username` and `role` entirely; a leaked refresh
/// token reveals nothing about the holder's privileges.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Principal id, string form
    pub sub: String,
    /// Username (access tokens only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Role (access tokens only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Token class
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Numeric principal id recovered from `sub`
    ///
    /// A validly-signed token whose subject is not numeric is rejected,
    /// never mapped to some default id.
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    /// Username claim, required on access tokens
    pub fn require_username(&self) -> Result<&str, AuthError> {
        self.username.as_deref().ok_or(AuthError::InvalidToken)
    }

    /// Role claim, required on access tokens
    pub fn require_role(&self) -> Result<Role, AuthError> {
        self.role.ok_or(AuthError::InvalidToken)
    }
}

/// Issues and validates access and refresh tokens
///
/// The signing key and lifetimes are fixed at construction; nothing here
/// mutates after startup.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // EncodingKey/DecodingKey are not Debug (and hold the signing secret)
        f.debug_struct("TokenService")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a token service
    ///
    /// Fails when the secret is shorter than [`MIN_SECRET_BYTES`] or a
    /// lifetime is not strictly positive, so a misconfigured service
    /// refuses to start instead of signing weak tokens.
    pub fn new(
        secret: &str,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Result<Self, AuthError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(AuthError::InvalidInput(format!(
                "Signing secret must be at least {} bytes, got {}",
                MIN_SECRET_BYTES,
                secret.len()
            )));
        }
        if access_ttl_secs <= 0 || refresh_ttl_secs <= 0 {
            return Err(AuthError::InvalidInput(
                "Token lifetimes must be positive".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
        })
    }

    /// Access token lifetime in seconds, as configured
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    /// Issue an access token carrying the full request identity
    pub fn issue_access_token(
        &self,
        user_id: i64,
        username: &str,
        role: Role,
    ) -> Result<String, AuthError> {
        if username.is_empty() {
            return Err(AuthError::InvalidInput("Username must not be empty".to_string()));
        }

        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: Some(username.to_string()),
            role: Some(role),
            token_type: TokenType::Access,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access_ttl_secs)).timestamp(),
        };

        debug!("Issuing access token for user: {}", username);

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Issue a refresh token carrying only the principal id
    pub fn issue_refresh_token(&self, user_id: i64) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: None,
            role: None,
            token_type: TokenType::Refresh,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.refresh_ttl_secs)).timestamp(),
        };

        debug!("Issuing refresh token for user id: {}", user_id);

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Validate an access token and return its claims
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate(token, TokenType::Access)
    }

    /// Validate a refresh token and return its claims
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate(token, TokenType::Refresh)
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        // Built-in expiry checking is off so the checks run in a fixed
        // order: signature, token class, then expiry. An expired token of
        // the wrong class must fail the class check, not report expiry.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                debug!("Token rejected: {}", e);
                AuthError::InvalidToken
            })?;
        let claims = token_data.claims;

        if claims.token_type != expected {
            debug!(
                "Token rejected: expected {} token, got {}",
                expected.as_str(),
                claims.token_type.as_str()
            );
            return Err(AuthError::InvalidToken);
        }

        // A claim window that never existed is malformed, not expired
        if claims.exp <= claims.iat {
            return Err(AuthError::InvalidToken);
        }

        // Expiry is exact: a token is valid strictly before exp
        let now = Utc::now().timestamp();
        if now >= claims.exp {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }
}
