//! Inventory stock tracking core for a multi-tenant invoicing platform.
//!
//! Per-(product, branch) stock quantities are derived exclusively from an
//! append-only movement ledger; every mutation runs through the movement
//! engine so the two stores can never diverge. On top of that sit branch
//! transfers, purchase receipts, per-organization settings and read-only
//! reporting projections.

pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod queries;
pub mod retry;
pub mod services;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Shared handler state: the connection pool plus one instance of each
/// service, all cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub inventory_service: services::inventory::InventoryService,
    pub settings_service: Arc<services::settings::InventorySettingsService>,
    pub catalog_service: services::catalog::CatalogService,
    pub reconciliation_service: services::reconciliation::ReconciliationService,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let settings_service = Arc::new(services::settings::InventorySettingsService::new(
            db.clone(),
            event_sender.clone(),
            Duration::from_secs(config.settings_cache_ttl_secs),
        ));
        let retry = retry::RetryConfig::from(&config.movement_retry);
        let inventory_service = services::inventory::InventoryService::new(
            db.clone(),
            event_sender.clone(),
            settings_service.clone(),
            retry,
        );
        let catalog_service = services::catalog::CatalogService::new(db.clone());
        let reconciliation_service = services::reconciliation::ReconciliationService::new(db.clone());

        Self {
            db,
            config,
            event_sender,
            inventory_service,
            settings_service,
            catalog_service,
            reconciliation_service,
        }
    }
}

/// Assembles the full API surface.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/openapi.json", get(openapi_spec))
        .nest("/api/v1/inventory", handlers::inventory::inventory_router())
        .nest("/api/v1/settings", handlers::settings::settings_router())
        .nest("/api/v1/reports", handlers::reports::reports_router())
        .nest("/api/v1/catalog", handlers::catalog::catalog_router())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match db::ping(state.db.as_ref()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "up" })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "down" })),
        ),
    }
}

async fn openapi_spec() -> impl IntoResponse {
    use utoipa::OpenApi;
    Json(openapi::ApiDoc::openapi())
}
