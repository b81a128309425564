//! Shop Directory REST API
//!
//! This crate provides the Axum-based HTTP API for the shop directory:
//! login and token refresh, shop listings, and user management.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
