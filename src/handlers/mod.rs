pub mod catalog;
pub mod inventory;
pub mod reports;
pub mod settings;

use crate::entities::{stock_level, stock_movement};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Ledger row as rendered to API clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovementDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub branch_id: Uuid,
    pub movement_type: String,
    pub quantity: Decimal,
    pub previous_quantity: Decimal,
    pub new_quantity: Decimal,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub cost_price: Option<Decimal>,
    pub notes: Option<String>,
    pub movement_date: DateTime<Utc>,
}

impl From<stock_movement::Model> for MovementDto {
    fn from(model: stock_movement::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            branch_id: model.branch_id,
            movement_type: model.movement_type,
            quantity: model.quantity,
            previous_quantity: model.previous_quantity,
            new_quantity: model.new_quantity,
            reference_type: model.reference_type,
            reference_id: model.reference_id,
            cost_price: model.cost_price,
            notes: model.notes,
            movement_date: model.movement_date,
        }
    }
}

/// Stock row as rendered to API clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StockLevelDto {
    pub id: Uuid,
    pub product_id: Uuid,
    pub branch_id: Uuid,
    pub quantity: Decimal,
    pub min_stock: Option<Decimal>,
    pub max_stock: Option<Decimal>,
    pub cost_price: Decimal,
    pub last_movement_at: Option<DateTime<Utc>>,
}

impl From<stock_level::Model> for StockLevelDto {
    fn from(model: stock_level::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            branch_id: model.branch_id,
            quantity: model.quantity,
            min_stock: model.min_stock,
            max_stock: model.max_stock,
            cost_price: model.cost_price,
            last_movement_at: model.last_movement_at,
        }
    }
}
