//! Shopdir Database Layer
//!
//! This crate provides the persistence layer for the shop directory,
//! using SQLite via sqlx. It owns the account store consulted by the
//! authentication subsystem and the shop listings it protects.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::{Database, ShopQuery};

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
