use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Factura Inventory API",
        description = "Stock movement ledger, branch transfers, purchase receipts and stock reporting"
    ),
    paths(
        crate::handlers::inventory::record_movement,
        crate::handlers::inventory::list_movements,
        crate::handlers::inventory::transfer_stock,
        crate::handlers::inventory::register_purchase,
        crate::handlers::inventory::get_stock_by_branch,
        crate::handlers::inventory::set_stock_thresholds,
        crate::handlers::settings::get_settings,
        crate::handlers::settings::update_settings,
        crate::handlers::reports::list_low_stock,
        crate::handlers::reports::branch_summary,
        crate::handlers::reports::run_reconciliation,
        crate::handlers::catalog::create_product,
        crate::handlers::catalog::create_branch,
        crate::handlers::catalog::set_tracking,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::MovementDto,
        crate::handlers::StockLevelDto,
        crate::handlers::inventory::RecordMovementRequest,
        crate::handlers::inventory::MovementResponse,
        crate::handlers::inventory::TransferRequest,
        crate::handlers::inventory::TransferResponse,
        crate::handlers::inventory::PurchaseRequest,
        crate::handlers::inventory::PurchaseLineRequest,
        crate::handlers::inventory::PurchaseResponse,
        crate::handlers::inventory::StockByBranchRow,
        crate::handlers::inventory::SetThresholdsRequest,
        crate::handlers::settings::SettingsResponse,
        crate::handlers::settings::UpdateSettingsRequest,
        crate::handlers::reports::LowStockItem,
        crate::handlers::reports::BranchSummaryItem,
        crate::handlers::reports::ReconciliationReport,
        crate::handlers::reports::DiscrepancyItem,
        crate::handlers::catalog::NewProductRequest,
        crate::handlers::catalog::NewBranchRequest,
        crate::handlers::catalog::SetTrackingRequest,
    )),
    tags(
        (name = "inventory", description = "Stock movements, transfers and purchases"),
        (name = "settings", description = "Per-organization inventory policy"),
        (name = "reports", description = "Read-only stock projections"),
        (name = "catalog", description = "Products and branches")
    )
)]
pub struct ApiDoc;
