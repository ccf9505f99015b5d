use crate::{
    errors::ServiceError,
    services::catalog::{NewBranch, NewProduct},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub fn catalog_router() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:product_id/tracking", put(set_tracking))
        .route("/branches", post(create_branch))
}

/// Create a catalog product.
#[utoipa::path(
    post,
    path = "/api/v1/catalog/products",
    request_body = NewProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<NewProductRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state
        .catalog_service
        .create_product(NewProduct {
            organization_id: payload.organization_id,
            name: payload.name,
            sku: payload.sku,
            unit_of_measure: payload.unit_of_measure,
            is_inventory_tracked: payload.is_inventory_tracked,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewProductRequest {
    pub organization_id: Uuid,
    pub name: String,
    pub sku: String,
    #[serde(default = "default_unit")]
    pub unit_of_measure: String,
    #[serde(default)]
    pub is_inventory_tracked: bool,
}

fn default_unit() -> String {
    "unidad".to_string()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewBranchRequest {
    pub organization_id: Uuid,
    pub name: String,
}

/// Create a branch.
#[utoipa::path(
    post,
    path = "/api/v1/catalog/branches",
    request_body = NewBranchRequest,
    responses(
        (status = 201, description = "Branch created"),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn create_branch(
    State(state): State<AppState>,
    Json(payload): Json<NewBranchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let branch = state
        .catalog_service
        .create_branch(NewBranch {
            organization_id: payload.organization_id,
            name: payload.name,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetTrackingRequest {
    pub organization_id: Uuid,
    pub enabled: bool,
}

/// Toggle the inventory-tracked flag. Disabling is rejected while the
/// product still holds nonzero stock anywhere.
#[utoipa::path(
    put,
    path = "/api/v1/catalog/products/{product_id}/tracking",
    params(("product_id" = Uuid, Path, description = "Product id")),
    request_body = SetTrackingRequest,
    responses(
        (status = 200, description = "Tracking flag updated"),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
        (status = 409, description = "Nonzero stock prevents disabling", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn set_tracking(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<SetTrackingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state
        .catalog_service
        .set_inventory_tracking(payload.organization_id, product_id, payload.enabled)
        .await?;
    Ok(Json(product))
}
