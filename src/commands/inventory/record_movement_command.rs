use crate::{
    commands::{error_label, unwrap_transaction_error, Command, CommandContext},
    commands::inventory::apply::{self, AppliedMovement, MovementSpec},
    entities::{
        stock_level, stock_movement,
        stock_movement::{MovementKind, ReferenceKind},
    },
    errors::ServiceError,
    events::Event,
    retry::with_conflict_retry,
};
use async_trait::async_trait;
use lazy_static::lazy_static;
use prometheus::{IntCounter, IntCounterVec, Opts};
use rust_decimal::Decimal;
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref STOCK_MOVEMENTS: IntCounter = IntCounter::new(
        "stock_movements_total",
        "Total number of recorded stock movements"
    )
    .expect("metric can be created");
    static ref STOCK_MOVEMENT_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "stock_movement_failures_total",
            "Total number of failed stock movements"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
}

/// The movement engine's single-movement contract: one signed quantity delta
/// against one (product, branch) pair, applied atomically with its ledger row.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordMovementCommand {
    pub organization_id: Uuid,
    pub product_id: Uuid,
    pub branch_id: Uuid,
    pub movement_type: MovementKind,
    /// Signed delta; sign must agree with the movement type
    pub quantity: Decimal,
    pub reference_type: Option<ReferenceKind>,
    pub reference_id: Option<Uuid>,
    /// Unit cost for incoming stock; feeds the weighted-average cost
    pub cost_price: Option<Decimal>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementResult {
    pub movement: stock_movement::Model,
    pub stock_level: stock_level::Model,
}

impl RecordMovementCommand {
    fn spec(&self) -> MovementSpec {
        MovementSpec {
            organization_id: self.organization_id,
            product_id: self.product_id,
            branch_id: self.branch_id,
            kind: self.movement_type,
            quantity: self.quantity,
            reference: match (self.reference_type, self.reference_id) {
                (Some(kind), Some(id)) => Some((kind, id)),
                _ => None,
            },
            cost_price: self.cost_price,
            notes: self.notes.clone(),
        }
    }

    async fn log_and_trigger_events(
        &self,
        ctx: &CommandContext,
        applied: &AppliedMovement,
    ) -> Result<(), ServiceError> {
        info!(
            organization_id = %self.organization_id,
            product_id = %self.product_id,
            branch_id = %self.branch_id,
            movement_type = %self.movement_type.as_str(),
            quantity = %self.quantity,
            new_quantity = %applied.stock_level.quantity,
            "Stock movement recorded"
        );

        ctx.event_sender
            .send(Event::StockMovementRecorded {
                movement_id: applied.movement.id,
                organization_id: self.organization_id,
                product_id: self.product_id,
                branch_id: self.branch_id,
                movement_type: applied.movement.movement_type.clone(),
                quantity: applied.movement.quantity,
                new_quantity: applied.stock_level.quantity,
            })
            .await
            .map_err(|e| {
                let msg = format!("Failed to send event for stock movement: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })?;

        let settings = ctx.settings.effective(self.organization_id).await?;
        if settings.inventory_enabled
            && self.quantity < Decimal::ZERO
            && applied
                .stock_level
                .is_low_stock(settings.low_stock_threshold)
        {
            let threshold = applied
                .stock_level
                .min_stock
                .unwrap_or(settings.low_stock_threshold);
            ctx.event_sender
                .send(Event::LowStockDetected {
                    organization_id: self.organization_id,
                    product_id: self.product_id,
                    branch_id: self.branch_id,
                    quantity: applied.stock_level.quantity,
                    threshold,
                    detected_at: chrono::Utc::now(),
                })
                .await
                .map_err(|e| ServiceError::EventError(e))?;
        }

        Ok(())
    }
}

#[async_trait]
impl Command for RecordMovementCommand {
    type Result = MovementResult;

    #[instrument(skip(self, ctx), fields(product_id = %self.product_id, branch_id = %self.branch_id))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            STOCK_MOVEMENT_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            ServiceError::ValidationError(format!("Invalid input: {}", e))
        })?;

        let settings = ctx.settings.effective(self.organization_id).await?;

        let applied = with_conflict_retry(&ctx.retry, || {
            let db = ctx.db.clone();
            let settings = settings.clone();
            let spec = self.spec();
            async move {
                db.transaction::<_, AppliedMovement, ServiceError>(move |txn| {
                    Box::pin(async move { apply::apply_movement(txn, &settings, &spec).await })
                })
                .await
                .map_err(unwrap_transaction_error)
            }
        })
        .await
        .map_err(|e| {
            STOCK_MOVEMENT_FAILURES
                .with_label_values(&[error_label(&e)])
                .inc();
            e
        })?;

        self.log_and_trigger_events(ctx, &applied).await?;
        STOCK_MOVEMENTS.inc();

        Ok(MovementResult {
            movement: applied.movement,
            stock_level: applied.stock_level,
        })
    }
}
