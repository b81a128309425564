//! Application state

use std::sync::Arc;

use shopdir_auth::{PasswordHasher, TokenService};
use shopdir_db::Database;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
    pub hasher: Arc<PasswordHasher>,
}

impl AppState {
    pub fn new(db: Database, tokens: Arc<TokenService>, hasher: Arc<PasswordHasher>) -> Self {
        Self { db, tokens, hasher }
    }
}
