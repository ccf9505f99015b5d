//! Read-only stock projections.
//!
//! Everything here reads the live stock_levels rows (plus catalog metadata);
//! none of it replays the movement ledger. Replay is the reconciliation
//! path, not a reporting path, and nothing in this module mutates.

use crate::{
    entities::{branch, product, stock_level, stock_movement},
    errors::ServiceError,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError>;
}

/// Stock at one branch joined with product metadata, lowest quantities
/// first so shortages surface at the top.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetStockByBranchQuery {
    pub organization_id: Uuid,
    pub branch_id: Uuid,
}

#[async_trait]
impl Query for GetStockByBranchQuery {
    type Result = Vec<(stock_level::Model, Option<product::Model>)>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        stock_level::Entity::find()
            .find_also_related(product::Entity)
            .filter(stock_level::Column::OrganizationId.eq(self.organization_id))
            .filter(stock_level::Column::BranchId.eq(self.branch_id))
            .order_by_asc(stock_level::Column::Quantity)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LowStockRow {
    pub product: product::Model,
    pub branch: branch::Model,
    pub current_stock: Decimal,
    pub min_stock: Decimal,
}

/// Stock rows at or below their effective threshold:
/// `coalesce(min_stock, org_default_threshold)`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListLowStockQuery {
    pub organization_id: Uuid,
    /// Organization default used when a row has no explicit min_stock
    pub default_threshold: Decimal,
}

#[async_trait]
impl Query for ListLowStockQuery {
    type Result = Vec<LowStockRow>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let rows = stock_level::Entity::find()
            .find_also_related(product::Entity)
            .filter(stock_level::Column::OrganizationId.eq(self.organization_id))
            .order_by_asc(stock_level::Column::Quantity)
            .all(db)
            .await?;

        let branches: HashMap<Uuid, branch::Model> = branch::Entity::find()
            .filter(branch::Column::OrganizationId.eq(self.organization_id))
            .all(db)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        let mut result = Vec::new();
        for (level, maybe_product) in rows {
            if !level.is_low_stock(self.default_threshold) {
                continue;
            }
            let (Some(product), Some(branch)) =
                (maybe_product, branches.get(&level.branch_id).cloned())
            else {
                continue;
            };
            result.push(LowStockRow {
                current_stock: level.quantity,
                min_stock: level.min_stock.unwrap_or(self.default_threshold),
                product,
                branch,
            });
        }
        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchStockSummary {
    pub branch_id: Uuid,
    pub branch_name: String,
    pub total_products: u64,
    pub total_quantity: Decimal,
    pub low_stock_count: u64,
}

/// Aggregate fold over stock rows grouped by branch. Branches with no stock
/// rows still appear, zeroed.
#[derive(Debug, Serialize, Deserialize)]
pub struct SummarizeByBranchQuery {
    pub organization_id: Uuid,
    pub default_threshold: Decimal,
}

#[async_trait]
impl Query for SummarizeByBranchQuery {
    type Result = Vec<BranchStockSummary>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let branches = branch::Entity::find()
            .filter(branch::Column::OrganizationId.eq(self.organization_id))
            .order_by_asc(branch::Column::Name)
            .all(db)
            .await?;

        let levels = stock_level::Entity::find()
            .filter(stock_level::Column::OrganizationId.eq(self.organization_id))
            .all(db)
            .await?;

        let mut by_branch: HashMap<Uuid, (u64, Decimal, u64)> = HashMap::new();
        for level in levels {
            let entry = by_branch
                .entry(level.branch_id)
                .or_insert((0, Decimal::ZERO, 0));
            entry.0 += 1;
            entry.1 += level.quantity;
            if level.is_low_stock(self.default_threshold) {
                entry.2 += 1;
            }
        }

        Ok(branches
            .into_iter()
            .map(|b| {
                let (total_products, total_quantity, low_stock_count) = by_branch
                    .get(&b.id)
                    .copied()
                    .unwrap_or((0, Decimal::ZERO, 0));
                BranchStockSummary {
                    branch_id: b.id,
                    branch_name: b.name,
                    total_products,
                    total_quantity,
                    low_stock_count,
                }
            })
            .collect())
    }
}

/// Ledger page, newest first, optionally narrowed to a product, branch or
/// reference group.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetMovementHistoryQuery {
    pub organization_id: Uuid,
    pub product_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub reference_id: Option<Uuid>,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait]
impl Query for GetMovementHistoryQuery {
    type Result = Vec<stock_movement::Model>;

    async fn execute(&self, db: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let mut query = stock_movement::Entity::find()
            .filter(stock_movement::Column::OrganizationId.eq(self.organization_id));
        if let Some(product_id) = self.product_id {
            query = query.filter(stock_movement::Column::ProductId.eq(product_id));
        }
        if let Some(branch_id) = self.branch_id {
            query = query.filter(stock_movement::Column::BranchId.eq(branch_id));
        }
        if let Some(reference_id) = self.reference_id {
            query = query.filter(stock_movement::Column::ReferenceId.eq(reference_id));
        }
        query
            .order_by_desc(stock_movement::Column::CreatedAt)
            .order_by_desc(stock_movement::Column::Id)
            .limit(self.limit)
            .offset(self.offset)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
