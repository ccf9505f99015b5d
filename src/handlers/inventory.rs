use crate::{
    commands::inventory::{
        PurchaseLine, RecordMovementCommand, RegisterPurchaseCommand, TransferStockCommand,
    },
    entities::stock_movement::{MovementKind, ReferenceKind},
    errors::ServiceError,
    handlers::{MovementDto, StockLevelDto},
    queries::stock_queries::{GetMovementHistoryQuery, GetStockByBranchQuery},
    queries::Query as StockQuery,
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub fn inventory_router() -> Router<AppState> {
    Router::new()
        .route("/movements", post(record_movement).get(list_movements))
        .route("/transfers", post(transfer_stock))
        .route("/purchases", post(register_purchase))
        .route("/stock/:branch_id", get(get_stock_by_branch))
        .route("/stock/thresholds", put(set_stock_thresholds))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordMovementRequest {
    pub organization_id: Uuid,
    pub product_id: Uuid,
    pub branch_id: Uuid,
    pub movement_type: MovementKind,
    pub quantity: Decimal,
    pub reference_type: Option<ReferenceKind>,
    pub reference_id: Option<Uuid>,
    pub cost_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementResponse {
    pub movement: MovementDto,
    pub stock_level: StockLevelDto,
}

/// Record one signed stock movement.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/movements",
    request_body = RecordMovementRequest,
    responses(
        (status = 201, description = "Movement recorded", body = MovementResponse),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product or branch", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
        (status = 409, description = "Write conflict", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn record_movement(
    State(state): State<AppState>,
    Json(payload): Json<RecordMovementRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state
        .inventory_service
        .record_movement(RecordMovementCommand {
            organization_id: payload.organization_id,
            product_id: payload.product_id,
            branch_id: payload.branch_id,
            movement_type: payload.movement_type,
            quantity: payload.quantity,
            reference_type: payload.reference_type,
            reference_id: payload.reference_id,
            cost_price: payload.cost_price,
            notes: payload.notes,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MovementResponse {
            movement: result.movement.into(),
            stock_level: result.stock_level.into(),
        }),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub organization_id: Uuid,
    pub product_id: Uuid,
    pub from_branch_id: Uuid,
    pub to_branch_id: Uuid,
    pub quantity: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResponse {
    pub transfer_id: Uuid,
    pub movement_out: MovementDto,
    pub movement_in: MovementDto,
}

/// Move stock between two branches atomically.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/transfers",
    request_body = TransferRequest,
    responses(
        (status = 201, description = "Transfer completed", body = TransferResponse),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock at source", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn transfer_stock(
    State(state): State<AppState>,
    Json(payload): Json<TransferRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state
        .inventory_service
        .transfer_stock(TransferStockCommand {
            organization_id: payload.organization_id,
            product_id: payload.product_id,
            from_branch_id: payload.from_branch_id,
            to_branch_id: payload.to_branch_id,
            quantity: payload.quantity,
            notes: payload.notes,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            transfer_id: result.transfer_id,
            movement_out: result.movement_out.into(),
            movement_in: result.movement_in.into(),
        }),
    ))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchaseLineRequest {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub cost_price: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PurchaseRequest {
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub lines: Vec<PurchaseLineRequest>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseResponse {
    pub purchase_id: Uuid,
    pub movements_created: usize,
    pub total_cost: Decimal,
}

/// Register a multi-line goods receipt.
#[utoipa::path(
    post,
    path = "/api/v1/inventory/purchases",
    request_body = PurchaseRequest,
    responses(
        (status = 201, description = "Purchase registered", body = PurchaseResponse),
        (status = 400, description = "Invalid purchase", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn register_purchase(
    State(state): State<AppState>,
    Json(payload): Json<PurchaseRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state
        .inventory_service
        .register_purchase(RegisterPurchaseCommand {
            organization_id: payload.organization_id,
            branch_id: payload.branch_id,
            lines: payload
                .lines
                .into_iter()
                .map(|line| PurchaseLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    cost_price: line.cost_price,
                })
                .collect(),
            notes: payload.notes,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            purchase_id: result.purchase_id,
            movements_created: result.movements_created,
            total_cost: result.total_cost,
        }),
    ))
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct OrganizationParam {
    pub organization_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockByBranchRow {
    #[serde(flatten)]
    pub level: StockLevelDto,
    pub product_name: Option<String>,
    pub product_sku: Option<String>,
}

/// Current stock at one branch, lowest quantities first.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/stock/{branch_id}",
    params(("branch_id" = Uuid, Path, description = "Branch id"), OrganizationParam),
    responses(
        (status = 200, description = "Stock list returned", body = [StockByBranchRow])
    ),
    tag = "inventory"
)]
pub async fn get_stock_by_branch(
    State(state): State<AppState>,
    Path(branch_id): Path<Uuid>,
    Query(params): Query<OrganizationParam>,
) -> Result<impl IntoResponse, ServiceError> {
    let rows = GetStockByBranchQuery {
        organization_id: params.organization_id,
        branch_id,
    }
    .execute(state.db.as_ref())
    .await?;

    let body: Vec<StockByBranchRow> = rows
        .into_iter()
        .map(|(level, product)| StockByBranchRow {
            level: level.into(),
            product_name: product.as_ref().map(|p| p.name.clone()),
            product_sku: product.map(|p| p.sku),
        })
        .collect();

    Ok(Json(body))
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct MovementHistoryParams {
    pub organization_id: Uuid,
    pub product_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub reference_id: Option<Uuid>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Ledger page, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/inventory/movements",
    params(MovementHistoryParams),
    responses(
        (status = 200, description = "Movement history returned", body = [MovementDto])
    ),
    tag = "inventory"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(params): Query<MovementHistoryParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let movements = GetMovementHistoryQuery {
        organization_id: params.organization_id,
        product_id: params.product_id,
        branch_id: params.branch_id,
        reference_id: params.reference_id,
        limit: params.limit.unwrap_or(50).min(500),
        offset: params.offset.unwrap_or(0),
    }
    .execute(state.db.as_ref())
    .await?;

    let body: Vec<MovementDto> = movements.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetThresholdsRequest {
    pub organization_id: Uuid,
    pub product_id: Uuid,
    pub branch_id: Uuid,
    pub min_stock: Option<Decimal>,
    pub max_stock: Option<Decimal>,
}

/// Set the advisory min/max bounds on a stock row.
#[utoipa::path(
    put,
    path = "/api/v1/inventory/stock/thresholds",
    request_body = SetThresholdsRequest,
    responses(
        (status = 200, description = "Thresholds updated", body = StockLevelDto),
        (status = 404, description = "No stock row for the pair", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn set_stock_thresholds(
    State(state): State<AppState>,
    Json(payload): Json<SetThresholdsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let level = state
        .inventory_service
        .set_stock_thresholds(
            payload.organization_id,
            payload.product_id,
            payload.branch_id,
            payload.min_stock,
            payload.max_stock,
        )
        .await?;
    Ok(Json(StockLevelDto::from(level)))
}
