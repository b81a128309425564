//! Shop directory routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use shopdir_auth::{authorize, Operation};
use shopdir_db::{NewShop, ShopQuery, UpdateShop};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{CreateShopRequest, ShopListQuery, ShopResponse, UpdateShopRequest};

// ==================== Input Validation ====================

/// Maximum allowed shop name length
const MAX_NAME_LENGTH: usize = 100;
/// Maximum allowed category length
const MAX_CATEGORY_LENGTH: usize = 50;
/// Maximum allowed address length
const MAX_ADDRESS_LENGTH: usize = 200;
/// Maximum allowed phone number length
const MAX_PHONE_LENGTH: usize = 30;
/// Maximum allowed description length
const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Validate a required text field, non-empty and within its cap
fn validate_required(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} cannot be empty", field)));
    }
    if value.len() > max {
        return Err(ApiError::BadRequest(format!(
            "{} exceeds maximum length of {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Validate an optional text field against its cap
fn validate_optional(field: &str, value: Option<&str>, max: usize) -> Result<(), ApiError> {
    if let Some(v) = value {
        if v.len() > max {
            return Err(ApiError::BadRequest(format!(
                "{} exceeds maximum length of {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

// ==================== Shop Routes ====================

/// GET /api/v1/shops
async fn list_shops(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(params): Query<ShopListQuery>,
) -> Result<Json<Vec<ShopResponse>>, ApiError> {
    authorize(&user, Operation::ShopList.required_roles())?;

    let shops = state
        .db
        .list_shops(ShopQuery {
            category: params.category,
            search: params.search,
        })
        .await?;

    Ok(Json(shops.into_iter().map(ShopResponse::from).collect()))
}

/// GET /api/v1/shops/{id}
async fn get_shop(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ShopResponse>, ApiError> {
    authorize(&user, Operation::ShopGet.required_roles())?;

    let shop = state
        .db
        .get_shop_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Shop: {}", id)))?;

    Ok(Json(shop.into()))
}

/// POST /api/v1/shops
async fn create_shop(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<CreateShopRequest>,
) -> Result<(StatusCode, Json<ShopResponse>), ApiError> {
    authorize(&user, Operation::ShopCreate.required_roles())?;

    validate_required("Name", &request.name, MAX_NAME_LENGTH)?;
    validate_required("Category", &request.category, MAX_CATEGORY_LENGTH)?;
    validate_required("Address", &request.address, MAX_ADDRESS_LENGTH)?;
    validate_optional("Phone", request.phone.as_deref(), MAX_PHONE_LENGTH)?;
    validate_optional(
        "Description",
        request.description.as_deref(),
        MAX_DESCRIPTION_LENGTH,
    )?;

    debug!("Creating shop: {}", request.name);

    let shop = state
        .db
        .insert_shop(NewShop {
            name: request.name,
            description: request.description,
            category: request.category,
            address: request.address,
            phone: request.phone,
            owner_id: Some(user.id),
        })
        .await?;

    info!("Created shop {} (id {})", shop.name, shop.id);

    Ok((StatusCode::CREATED, Json(shop.into())))
}

/// PUT /api/v1/shops/{id}
async fn update_shop(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateShopRequest>,
) -> Result<Json<ShopResponse>, ApiError> {
    authorize(&user, Operation::ShopUpdate.required_roles())?;

    if let Some(name) = &request.name {
        validate_required("Name", name, MAX_NAME_LENGTH)?;
    }
    if let Some(category) = &request.category {
        validate_required("Category", category, MAX_CATEGORY_LENGTH)?;
    }
    if let Some(address) = &request.address {
        validate_required("Address", address, MAX_ADDRESS_LENGTH)?;
    }
    validate_optional("Phone", request.phone.as_deref(), MAX_PHONE_LENGTH)?;
    validate_optional(
        "Description",
        request.description.as_deref(),
        MAX_DESCRIPTION_LENGTH,
    )?;

    debug!("Updating shop: {}", id);

    let updated = state
        .db
        .update_shop(
            id,
            UpdateShop {
                name: request.name,
                description: request.description,
                category: request.category,
                address: request.address,
                phone: request.phone,
            },
        )
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Shop: {}", id)))?;

    info!("Updated shop {} (id {})", updated.name, updated.id);

    Ok(Json(updated.into()))
}

/// DELETE /api/v1/shops/{id}
async fn delete_shop(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    authorize(&user, Operation::ShopDelete.required_roles())?;

    debug!("Deleting shop: {}", id);

    let deleted = state.db.delete_shop(id).await?;

    if deleted {
        info!("Deleted shop: {}", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Shop: {}", id)))
    }
}

/// Create shop routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/shops", get(list_shops))
        .route("/api/v1/shops", post(create_shop))
        .route("/api/v1/shops/{id}", get(get_shop))
        .route("/api/v1/shops/{id}", put(update_shop))
        .route("/api/v1/shops/{id}", delete(delete_shop))
}
