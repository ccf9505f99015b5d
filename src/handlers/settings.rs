use crate::{
    errors::ServiceError,
    handlers::inventory::OrganizationParam,
    services::settings::SettingsPatch,
    AppState,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub fn settings_router() -> Router<AppState> {
    Router::new().route("/", get(get_settings).put(update_settings))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub organization_id: Uuid,
    pub inventory_enabled: bool,
    pub low_stock_threshold: Decimal,
    pub auto_deduct_on_invoice: bool,
    pub require_stock_validation: bool,
}

/// Effective inventory settings for an organization (defaults when unset).
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    params(OrganizationParam),
    responses(
        (status = 200, description = "Settings returned", body = SettingsResponse)
    ),
    tag = "settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
    Query(params): Query<OrganizationParam>,
) -> Result<impl IntoResponse, ServiceError> {
    // Bypass the TTL cache so the settings screen always reads fresh values.
    state.settings_service.invalidate(params.organization_id);
    let settings = state
        .settings_service
        .effective(params.organization_id)
        .await?;
    Ok(Json(SettingsResponse {
        organization_id: params.organization_id,
        inventory_enabled: settings.inventory_enabled,
        low_stock_threshold: settings.low_stock_threshold,
        auto_deduct_on_invoice: settings.auto_deduct_on_invoice,
        require_stock_validation: settings.require_stock_validation,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub organization_id: Uuid,
    pub inventory_enabled: Option<bool>,
    pub low_stock_threshold: Option<Decimal>,
    pub auto_deduct_on_invoice: Option<bool>,
    pub require_stock_validation: Option<bool>,
}

/// Last-write-wins settings update.
#[utoipa::path(
    put,
    path = "/api/v1/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = SettingsResponse),
        (status = 400, description = "Invalid threshold", body = crate::errors::ErrorResponse)
    ),
    tag = "settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state
        .settings_service
        .update(
            payload.organization_id,
            SettingsPatch {
                inventory_enabled: payload.inventory_enabled,
                low_stock_threshold: payload.low_stock_threshold,
                auto_deduct_on_invoice: payload.auto_deduct_on_invoice,
                require_stock_validation: payload.require_stock_validation,
            },
        )
        .await?;
    Ok(Json(SettingsResponse {
        organization_id: payload.organization_id,
        inventory_enabled: updated.inventory_enabled,
        low_stock_threshold: updated.low_stock_threshold,
        auto_deduct_on_invoice: updated.auto_deduct_on_invoice,
        require_stock_validation: updated.require_stock_validation,
    }))
}
