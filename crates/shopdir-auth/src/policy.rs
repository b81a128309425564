//! Authorization policy
//!
//! One table maps every protected operation to the roles allowed to
//! perform it, and one function checks membership. Handlers hold an
//! [`AuthUser`] (which only the authentication gate can produce) and call
//! [`authorize`]; there are no role conditionals anywhere else.

use serde::{Deserialize, Serialize};

use shopdir_db::Role;

use crate::error::AuthError;
use crate::token::Claims;

/// Authenticated principal attached to a request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    /// Build the resolved identity from validated access-token claims
    ///
    /// Absent or malformed identity claims reject the token. An identity
    /// is never assembled from fallback values.
    pub fn from_claims(claims: &Claims) -> Result<Self, AuthError> {
        Ok(Self {
            id: claims.user_id()?,
            username: claims.require_username()?.to_string(),
            role: claims.require_role()?,
        })
    }
}

/// Protected operations of the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ShopList,
    ShopGet,
    ShopCreate,
    ShopUpdate,
    ShopDelete,
    UserList,
    UserGet,
    UserCreate,
    UserUpdate,
    UserDelete,
}

impl Operation {
    /// Roles allowed to perform this operation
    ///
    /// An empty slice admits any authenticated principal.
    pub fn required_roles(&self) -> &'static [Role] {
        match self {
            Operation::ShopList | Operation::ShopGet => &[],
            Operation::ShopCreate | Operation::ShopUpdate => &[Role::User, Role::Admin],
            Operation::ShopDelete => &[Role::Admin],
            Operation::UserList
            | Operation::UserGet
            | Operation::UserCreate
            | Operation::UserUpdate
            | Operation::UserDelete => &[Role::Admin],
        }
    }
}

/// Check that an authenticated principal holds one of the required roles
///
/// Exact membership, no hierarchy: Admin does not implicitly hold User.
/// An empty requirement admits any authenticated principal. Pure
/// computation; the store is never consulted here.
pub fn authorize(user: &AuthUser, required: &'static [Role]) -> Result<(), AuthError> {
    if required.is_empty() || required.contains(&user.role) {
        return Ok(());
    }

    Err(AuthError::InsufficientRole {
        required,
        actual: user.role,
    })
}
