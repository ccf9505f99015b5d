use crate::{
    commands::{error_label, unwrap_transaction_error, Command, CommandContext},
    commands::inventory::apply::{self, AppliedMovement, MovementSpec},
    entities::stock_movement::{self, MovementKind, ReferenceKind},
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
    static ref STOCK_TRANSFERS: IntCounter = IntCounter::new(
        "stock_transfers_total",
        "Total number of completed stock transfers"
    )
    .expect("metric can be created");
    static ref STOCK_TRANSFER_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "stock_transfer_failures_total",
            "Total number of failed stock transfers"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
}

/// Moves stock between two branches as one atomic unit: a debit at the
/// source and a credit at the destination sharing one transfer group id.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransferStockCommand {
    pub organization_id: Uuid,
    pub product_id: Uuid,
    pub from_branch_id: Uuid,
    pub to_branch_id: Uuid,
    /// Amount moved; must be positive
    pub quantity: Decimal,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    pub transfer_id: Uuid,
    pub movement_out: stock_movement::Model,
    pub movement_in: stock_movement::Model,
}

impl TransferStockCommand {
    fn leg_specs(&self, transfer_id: Uuid) -> (MovementSpec, MovementSpec) {
        let debit = MovementSpec {
            organization_id: self.organization_id,
            product_id: self.product_id,
            branch_id: self.from_branch_id,
            kind: MovementKind::TransferenciaSalida,
            quantity: -self.quantity,
            reference: Some((ReferenceKind::Transferencia, transfer_id)),
            cost_price: None,
            notes: self.notes.clone(),
        };
        let credit = MovementSpec {
            organization_id: self.organization_id,
            product_id: self.product_id,
            branch_id: self.to_branch_id,
            kind: MovementKind::TransferenciaEntrada,
            quantity: self.quantity,
            reference: Some((ReferenceKind::Transferencia, transfer_id)),
            cost_price: None,
            notes: self.notes.clone(),
        };
        (debit, credit)
    }
}

#[async_trait]
impl Command for TransferStockCommand {
    type Result = TransferResult;

    #[instrument(skip(self, ctx), fields(product_id = %self.product_id))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            STOCK_TRANSFER_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            ServiceError::ValidationError(format!("Invalid input: {}", e))
        })?;
        if self.quantity <= Decimal::ZERO {
            STOCK_TRANSFER_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            return Err(ServiceError::InvalidInput(
                "transfer quantity must be positive".to_string(),
            ));
        }
        if self.from_branch_id == self.to_branch_id {
            STOCK_TRANSFER_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            return Err(ServiceError::InvalidInput(
                "cannot transfer stock to the same branch".to_string(),
            ));
        }

        let settings = ctx.settings.effective(self.organization_id).await?;
        let transfer_id = Uuid::new_v4();

        let (out_leg, in_leg) = with_conflict_retry(&ctx.retry, || {
            let db = ctx.db.clone();
            let settings = settings.clone();
            let (debit, credit) = self.leg_specs(transfer_id);
            async move {
                db.transaction::<_, (AppliedMovement, AppliedMovement), ServiceError>(
                    move |txn| {
                        Box::pin(async move {
                            // Branch-id order fixes the stock-row lock order,
                            // so two opposite concurrent transfers cannot
                            // deadlock. A failed leg rolls the whole unit
                            // back; observers never see a dangling debit.
                            if debit.branch_id <= credit.branch_id {
                                let out = apply::apply_movement(txn, &settings, &debit).await?;
                                let inn = apply::apply_movement(txn, &settings, &credit).await?;
                                Ok((out, inn))
                            } else {
                                let inn = apply::apply_movement(txn, &settings, &credit).await?;
                                let out = apply::apply_movement(txn, &settings, &debit).await?;
                                Ok((out, inn))
                            }
                        })
                    },
                )
                .await
                .map_err(unwrap_transaction_error)
            }
        })
        .await
        .map_err(|e| {
            STOCK_TRANSFER_FAILURES
                .with_label_values(&[error_label(&e)])
                .inc();
            e
        })?;

        info!(
            organization_id = %self.organization_id,
            product_id = %self.product_id,
            from_branch_id = %self.from_branch_id,
            to_branch_id = %self.to_branch_id,
            quantity = %self.quantity,
            transfer_id = %transfer_id,
            "Stock transferred"
        );

        ctx.event_sender
            .send(Event::StockTransferred {
                transfer_id,
                organization_id: self.organization_id,
                product_id: self.product_id,
                from_branch_id: self.from_branch_id,
                to_branch_id: self.to_branch_id,
                quantity: self.quantity,
            })
            .await
            .map_err(|e| {
                let msg = format!("Failed to send event for stock transfer: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })?;

        STOCK_TRANSFERS.inc();

        Ok(TransferResult {
            transfer_id,
            movement_out: out_leg.movement,
            movement_in: in_leg.movement,
        })
    }
}
