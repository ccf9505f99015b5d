use crate::{
    errors::ServiceError,
    handlers::inventory::OrganizationParam,
    queries::stock_queries::{ListLowStockQuery, SummarizeByBranchQuery},
    queries::Query as StockQuery,
    AppState,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub fn reports_router() -> Router<AppState> {
    Router::new()
        .route("/low-stock", get(list_low_stock))
        .route("/branch-summary", get(branch_summary))
        .route("/reconciliation", get(run_reconciliation))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LowStockItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_sku: String,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub current_stock: Decimal,
    pub min_stock: Decimal,
}

/// Stock rows at or below their effective low-stock threshold.
#[utoipa::path(
    get,
    path = "/api/v1/reports/low-stock",
    params(OrganizationParam),
    responses(
        (status = 200, description = "Low stock listing returned", body = [LowStockItem])
    ),
    tag = "reports"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    Query(params): Query<OrganizationParam>,
) -> Result<impl IntoResponse, ServiceError> {
    let settings = state
        .settings_service
        .effective(params.organization_id)
        .await?;
    let rows = ListLowStockQuery {
        organization_id: params.organization_id,
        default_threshold: settings.low_stock_threshold,
    }
    .execute(state.db.as_ref())
    .await?;

    let body: Vec<LowStockItem> = rows
        .into_iter()
        .map(|row| LowStockItem {
            product_id: row.product.id,
            product_name: row.product.name,
            product_sku: row.product.sku,
            branch_id: row.branch.id,
            branch_name: row.branch.name,
            current_stock: row.current_stock,
            min_stock: row.min_stock,
        })
        .collect();
    Ok(Json(body))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BranchSummaryItem {
    pub branch_id: Uuid,
    pub branch_name: String,
    pub total_products: u64,
    pub total_quantity: Decimal,
    pub low_stock_count: u64,
}

/// Aggregate stock position per branch.
#[utoipa::path(
    get,
    path = "/api/v1/reports/branch-summary",
    params(OrganizationParam),
    responses(
        (status = 200, description = "Branch summaries returned", body = [BranchSummaryItem])
    ),
    tag = "reports"
)]
pub async fn branch_summary(
    State(state): State<AppState>,
    Query(params): Query<OrganizationParam>,
) -> Result<impl IntoResponse, ServiceError> {
    let settings = state
        .settings_service
        .effective(params.organization_id)
        .await?;
    let summaries = SummarizeByBranchQuery {
        organization_id: params.organization_id,
        default_threshold: settings.low_stock_threshold,
    }
    .execute(state.db.as_ref())
    .await?;

    let body: Vec<BranchSummaryItem> = summaries
        .into_iter()
        .map(|s| BranchSummaryItem {
            branch_id: s.branch_id,
            branch_name: s.branch_name,
            total_products: s.total_products,
            total_quantity: s.total_quantity,
            low_stock_count: s.low_stock_count,
        })
        .collect();
    Ok(Json(body))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconciliationReport {
    pub discrepancies: Vec<DiscrepancyItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DiscrepancyItem {
    pub product_id: Uuid,
    pub branch_id: Uuid,
    pub stored_quantity: Decimal,
    pub replayed_quantity: Decimal,
    pub chain_broken_at: Option<Uuid>,
}

/// Replays every ledger chain and reports stock rows that diverge.
#[utoipa::path(
    get,
    path = "/api/v1/reports/reconciliation",
    params(OrganizationParam),
    responses(
        (status = 200, description = "Reconciliation report returned", body = ReconciliationReport)
    ),
    tag = "reports"
)]
pub async fn run_reconciliation(
    State(state): State<AppState>,
    Query(params): Query<OrganizationParam>,
) -> Result<impl IntoResponse, ServiceError> {
    let discrepancies = state
        .reconciliation_service
        .reconcile_organization(params.organization_id)
        .await?;
    Ok(Json(ReconciliationReport {
        discrepancies: discrepancies
            .into_iter()
            .map(|d| DiscrepancyItem {
                product_id: d.product_id,
                branch_id: d.branch_id,
                stored_quantity: d.stored_quantity,
                replayed_quantity: d.replayed_quantity,
                chain_broken_at: d.chain_broken_at,
            })
            .collect(),
    }))
}
