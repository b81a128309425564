//! Shopdir Authentication and Authorization
//!
//! This crate provides credential hashing, signed access/refresh tokens,
//! and role-based authorization for the shop directory. The HTTP gate
//! that drives it lives in shopdir-api; everything here is plain
//! computation over keys, claims, and roles.

pub mod error;
pub mod password;
pub mod policy;
pub mod token;

pub use error::AuthError;
pub use password::{HashingParams, PasswordHasher};
pub use policy::{AuthUser, Operation, authorize};
pub use token::{Claims, MIN_SECRET_BYTES, TokenService, TokenType};
