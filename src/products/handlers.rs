use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::MessageResponse,
        extractors::{require, CurrentAdmin, Gate, GateLayer},
    },
    error::ApiError,
    products::{
        dto::{CreateProductRequest, UpdateProductRequest},
        repo_types::{NewProduct, Product, ProductChanges},
    },
    state::AppState,
};

// Admin tokens never resolve in users, so Protect is not stacked in front.
const MUTATION_GATES: &[Gate] = &[Gate::AdminOnly];

// --- routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
}

pub fn write_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
        .route_layer(middleware::from_fn_with_state(
            GateLayer::new(state.clone(), MUTATION_GATES),
            require,
        ))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Product not found".into())
}

/// Ids that are not UUIDs cannot name a product.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| not_found())
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list().await?))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&id)?;
    state.catalog.find(id).await?.map(Json).ok_or_else(not_found)
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn create_product(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(payload) = payload?;
    let product = state.catalog.create(NewProduct::try_from(payload)?).await?;
    info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn update_product(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id(&id)?;
    let Json(payload) = payload?;
    let changes = ProductChanges::try_from(payload)?;
    let product = state.catalog.update(id, changes).await?.ok_or_else(|| {
        warn!(product_id = %id, "update of missing product");
        not_found()
    })?;
    info!(product_id = %product.id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    if !state.catalog.delete(id).await? {
        warn!(product_id = %id, "delete of missing product");
        return Err(not_found());
    }
    info!(product_id = %id, "product deleted");
    Ok(Json(MessageResponse::new("Product removed successfully")))
}
