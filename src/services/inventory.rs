use crate::{
    commands::{
        inventory::{
            MovementResult, PurchaseResult, RecordMovementCommand, RegisterPurchaseCommand,
            TransferResult, TransferStockCommand,
        },
        Command, CommandContext,
    },
    db::DbPool,
    entities::{
        product, stock_level,
        stock_movement::{MovementKind, ReferenceKind},
    },
    errors::ServiceError,
    events::EventSender,
    retry::RetryConfig,
    services::settings::InventorySettingsService,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// One invoice line handed over by the invoicing workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub product_id: Uuid,
    pub branch_id: Uuid,
    pub quantity: Decimal,
}

/// Facade over the inventory commands plus the read paths the invoicing
/// workflow needs. All mutations bottom out in the movement engine.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DbPool>,
    event_sender: EventSender,
    settings: Arc<InventorySettingsService>,
    retry: RetryConfig,
}

impl InventoryService {
    pub fn new(
        db: Arc<DbPool>,
        event_sender: EventSender,
        settings: Arc<InventorySettingsService>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            db,
            event_sender,
            settings,
            retry,
        }
    }

    fn ctx(&self) -> CommandContext {
        CommandContext {
            db: self.db.clone(),
            event_sender: self.event_sender.clone(),
            settings: self.settings.clone(),
            retry: self.retry.clone(),
        }
    }

    /// Applies a single signed movement. See the movement engine contract.
    #[instrument(skip(self, command))]
    pub async fn record_movement(
        &self,
        command: RecordMovementCommand,
    ) -> Result<MovementResult, ServiceError> {
        command.execute(&self.ctx()).await
    }

    /// Moves stock between branches as one atomic unit.
    #[instrument(skip(self, command))]
    pub async fn transfer_stock(
        &self,
        command: TransferStockCommand,
    ) -> Result<TransferResult, ServiceError> {
        command.execute(&self.ctx()).await
    }

    /// Registers a multi-line goods receipt as one atomic unit.
    #[instrument(skip(self, command))]
    pub async fn register_purchase(
        &self,
        command: RegisterPurchaseCommand,
    ) -> Result<PurchaseResult, ServiceError> {
        command.execute(&self.ctx()).await
    }

    /// Current stock row for a (product, branch) pair, if one exists yet.
    #[instrument(skip(self))]
    pub async fn get_stock_level(
        &self,
        organization_id: Uuid,
        product_id: Uuid,
        branch_id: Uuid,
    ) -> Result<Option<stock_level::Model>, ServiceError> {
        let level = stock_level::Entity::find()
            .filter(stock_level::Column::OrganizationId.eq(organization_id))
            .filter(stock_level::Column::ProductId.eq(product_id))
            .filter(stock_level::Column::BranchId.eq(branch_id))
            .one(self.db.as_ref())
            .await?;
        Ok(level)
    }

    /// Sets the advisory min/max bounds on a stock row. Quantities are never
    /// settable here; only movements change them.
    #[instrument(skip(self))]
    pub async fn set_stock_thresholds(
        &self,
        organization_id: Uuid,
        product_id: Uuid,
        branch_id: Uuid,
        min_stock: Option<Decimal>,
        max_stock: Option<Decimal>,
    ) -> Result<stock_level::Model, ServiceError> {
        if let Some(min) = min_stock {
            if min < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "min_stock cannot be negative: {}",
                    min
                )));
            }
        }
        if let (Some(min), Some(max)) = (min_stock, max_stock) {
            if max < min {
                return Err(ServiceError::ValidationError(format!(
                    "max_stock {} is below min_stock {}",
                    max, min
                )));
            }
        }

        let level = self
            .get_stock_level(organization_id, product_id, branch_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "stock level for product {} at branch {}",
                    product_id, branch_id
                ))
            })?;

        let version = level.version;
        let mut active: stock_level::ActiveModel = level.into();
        active.min_stock = Set(min_stock);
        active.max_stock = Set(max_stock);
        active.version = Set(version + 1);
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db.as_ref()).await?)
    }

    /// Invoice-posting hook: when `auto_deduct_on_invoice` is enabled, issues
    /// one `salida` per tracked-product line referencing the invoice. Lines
    /// for untracked or unknown products are skipped. Each line is its own
    /// atomic unit; the invoicing workflow owns invoice-level consistency.
    #[instrument(skip(self, lines))]
    pub async fn deduct_for_invoice(
        &self,
        organization_id: Uuid,
        invoice_id: Uuid,
        lines: &[InvoiceLine],
    ) -> Result<Vec<MovementResult>, ServiceError> {
        let settings = self.settings.effective(organization_id).await?;
        if !settings.inventory_enabled || !settings.auto_deduct_on_invoice {
            debug!(
                organization_id = %organization_id,
                "Invoice deduction skipped: auto-deduct disabled"
            );
            return Ok(Vec::new());
        }
        self.apply_invoice_lines(organization_id, invoice_id, lines, MovementKind::Salida)
            .await
    }

    /// Compensates a deleted invoice with `entrada` movements mirroring the
    /// original deduction.
    #[instrument(skip(self, lines))]
    pub async fn restock_for_invoice(
        &self,
        organization_id: Uuid,
        invoice_id: Uuid,
        lines: &[InvoiceLine],
    ) -> Result<Vec<MovementResult>, ServiceError> {
        self.apply_invoice_lines(organization_id, invoice_id, lines, MovementKind::Entrada)
            .await
    }

    async fn apply_invoice_lines(
        &self,
        organization_id: Uuid,
        invoice_id: Uuid,
        lines: &[InvoiceLine],
        kind: MovementKind,
    ) -> Result<Vec<MovementResult>, ServiceError> {
        let mut results = Vec::new();
        for line in lines {
            if line.quantity <= Decimal::ZERO {
                return Err(ServiceError::InvalidInput(format!(
                    "invoice line for product {}: quantity must be positive",
                    line.product_id
                )));
            }
            let tracked = product::Entity::find_by_id(line.product_id)
                .one(self.db.as_ref())
                .await?
                .map(|p| p.organization_id == organization_id && p.is_inventory_tracked)
                .unwrap_or(false);
            if !tracked {
                debug!(
                    product_id = %line.product_id,
                    "Invoice line skipped: product not inventory tracked"
                );
                continue;
            }

            let delta = if kind == MovementKind::Salida {
                -line.quantity
            } else {
                line.quantity
            };
            let result = self
                .record_movement(RecordMovementCommand {
                    organization_id,
                    product_id: line.product_id,
                    branch_id: line.branch_id,
                    movement_type: kind,
                    quantity: delta,
                    reference_type: Some(ReferenceKind::Factura),
                    reference_id: Some(invoice_id),
                    cost_price: None,
                    notes: None,
                })
                .await?;
            results.push(result);
        }
        Ok(results)
    }
}
