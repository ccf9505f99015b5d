use crate::{
    db::DbPool,
    entities::{branch, product, stock_level},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    pub organization_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub sku: String,
    #[validate(length(min = 1, max = 50))]
    pub unit_of_measure: String,
    #[serde(default)]
    pub is_inventory_tracked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewBranch {
    pub organization_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Products and branches are thin catalog rows; the only rule with teeth
/// lives in `set_inventory_tracking`.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, new_product))]
    pub async fn create_product(
        &self,
        new_product: NewProduct,
    ) -> Result<product::Model, ServiceError> {
        new_product.validate()?;
        let now = Utc::now();
        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(new_product.organization_id),
            name: Set(new_product.name),
            sku: Set(new_product.sku),
            unit_of_measure: Set(new_product.unit_of_measure),
            is_inventory_tracked: Set(new_product.is_inventory_tracked),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await?;
        info!(product_id = %created.id, sku = %created.sku, "Product created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_product(
        &self,
        organization_id: Uuid,
        product_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        let found = product::Entity::find_by_id(product_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", product_id)))?;
        if found.organization_id != organization_id {
            return Err(ServiceError::OrganizationMismatch(format!(
                "product {}",
                product_id
            )));
        }
        Ok(found)
    }

    #[instrument(skip(self, new_branch))]
    pub async fn create_branch(&self, new_branch: NewBranch) -> Result<branch::Model, ServiceError> {
        new_branch.validate()?;
        let now = Utc::now();
        let created = branch::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(new_branch.organization_id),
            name: Set(new_branch.name),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await?;
        info!(branch_id = %created.id, "Branch created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_branch(
        &self,
        organization_id: Uuid,
        branch_id: Uuid,
    ) -> Result<branch::Model, ServiceError> {
        let found = branch::Entity::find_by_id(branch_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("branch {}", branch_id)))?;
        if found.organization_id != organization_id {
            return Err(ServiceError::OrganizationMismatch(format!(
                "branch {}",
                branch_id
            )));
        }
        Ok(found)
    }

    /// Toggles the inventory-tracked flag. Enabling is always allowed;
    /// disabling is rejected while any stock level for the product still
    /// holds a nonzero quantity, because the ledger would keep referencing
    /// live stock the validation layer could no longer see.
    #[instrument(skip(self))]
    pub async fn set_inventory_tracking(
        &self,
        organization_id: Uuid,
        product_id: Uuid,
        enabled: bool,
    ) -> Result<product::Model, ServiceError> {
        let found = self.get_product(organization_id, product_id).await?;
        if found.is_inventory_tracked == enabled {
            return Ok(found);
        }

        if !enabled {
            let live_rows = stock_level::Entity::find()
                .filter(stock_level::Column::ProductId.eq(product_id))
                .filter(stock_level::Column::Quantity.ne(Decimal::ZERO))
                .count(self.db.as_ref())
                .await?;
            if live_rows > 0 {
                return Err(ServiceError::Conflict(format!(
                    "cannot disable inventory tracking for product {}: nonzero stock at {} branch(es)",
                    product_id, live_rows
                )));
            }
        }

        let mut active: product::ActiveModel = found.into();
        active.is_inventory_tracked = Set(enabled);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.db.as_ref()).await?;
        info!(
            product_id = %product_id,
            enabled = enabled,
            "Inventory tracking flag changed"
        );
        Ok(updated)
    }
}
