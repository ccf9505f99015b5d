use crate::{
    commands::{error_label, unwrap_transaction_error, Command, CommandContext},
    commands::inventory::apply::{self, AppliedMovement, MovementSpec},
    entities::stock_movement::{MovementKind, ReferenceKind},
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
    static ref PURCHASES_REGISTERED: IntCounter = IntCounter::new(
        "purchases_registered_total",
        "Total number of registered purchase batches"
    )
    .expect("metric can be created");
    static ref PURCHASE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "purchase_failures_total",
            "Total number of failed purchase batches"
        ),
        &["error_type"]
    )
    .expect("metric can be created");
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub cost_price: Decimal,
}

/// Multi-line goods receipt: one `entrada` per line, all sharing a single
/// purchase reference, applied as one atomic unit.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterPurchaseCommand {
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    #[validate(length(min = 1, message = "Purchase must contain at least one line"))]
    pub lines: Vec<PurchaseLine>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResult {
    pub purchase_id: Uuid,
    pub movements_created: usize,
    pub total_cost: Decimal,
}

impl RegisterPurchaseCommand {
    /// Fail-fast validation; nothing touches storage until every line is
    /// well-formed.
    fn validate_lines(&self) -> Result<(), ServiceError> {
        if self.branch_id.is_nil() {
            return Err(ServiceError::InvalidInput(
                "purchase branch is required".to_string(),
            ));
        }
        for (index, line) in self.lines.iter().enumerate() {
            if line.quantity <= Decimal::ZERO {
                return Err(ServiceError::InvalidInput(format!(
                    "line {} (product {}): quantity must be positive, got {}",
                    index + 1,
                    line.product_id,
                    line.quantity
                )));
            }
            if line.cost_price < Decimal::ZERO {
                return Err(ServiceError::InvalidInput(format!(
                    "line {} (product {}): cost price cannot be negative, got {}",
                    index + 1,
                    line.product_id,
                    line.cost_price
                )));
            }
        }
        Ok(())
    }

    fn total_cost(&self) -> Decimal {
        self.lines
            .iter()
            .map(|line| line.quantity * line.cost_price)
            .sum()
    }
}

#[async_trait]
impl Command for RegisterPurchaseCommand {
    type Result = PurchaseResult;

    #[instrument(skip(self, ctx), fields(branch_id = %self.branch_id, lines = self.lines.len()))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            PURCHASE_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            ServiceError::ValidationError(format!("Invalid input: {}", e))
        })?;
        self.validate_lines().map_err(|e| {
            PURCHASE_FAILURES
                .with_label_values(&["validation_error"])
                .inc();
            e
        })?;

        let settings = ctx.settings.effective(self.organization_id).await?;
        let purchase_id = Uuid::new_v4();

        // Lines are applied in product-id order so concurrent purchases and
        // transfers acquire stock-row locks in the same global order.
        let mut ordered = self.lines.clone();
        ordered.sort_by_key(|line| line.product_id);

        let applied = with_conflict_retry(&ctx.retry, || {
            let db = ctx.db.clone();
            let settings = settings.clone();
            let organization_id = self.organization_id;
            let branch_id = self.branch_id;
            let notes = self.notes.clone();
            let lines = ordered.clone();
            async move {
                db.transaction::<_, Vec<AppliedMovement>, ServiceError>(move |txn| {
                    Box::pin(async move {
                        let mut results = Vec::with_capacity(lines.len());
                        for line in &lines {
                            let spec = MovementSpec {
                                organization_id,
                                product_id: line.product_id,
                                branch_id,
                                kind: MovementKind::Entrada,
                                quantity: line.quantity,
                                reference: Some((ReferenceKind::Compra, purchase_id)),
                                cost_price: Some(line.cost_price),
                                notes: notes.clone(),
                            };
                            // Any rejected line aborts the transaction and
                            // rolls back every previously applied line.
                            results.push(apply::apply_movement(txn, &settings, &spec).await?);
                        }
                        Ok(results)
                    })
                })
                .await
                .map_err(unwrap_transaction_error)
            }
        })
        .await
        .map_err(|e| {
            PURCHASE_FAILURES
                .with_label_values(&[error_label(&e)])
                .inc();
            e
        })?;

        let total_cost = self.total_cost();

        info!(
            organization_id = %self.organization_id,
            branch_id = %self.branch_id,
            purchase_id = %purchase_id,
            movements_created = applied.len(),
            total_cost = %total_cost,
            "Purchase registered"
        );

        ctx.event_sender
            .send(Event::PurchaseRegistered {
                purchase_id,
                organization_id: self.organization_id,
                branch_id: self.branch_id,
                movements_created: applied.len(),
                total_cost,
            })
            .await
            .map_err(|e| {
                let msg = format!("Failed to send event for purchase: {}", e);
                error!("{}", msg);
                ServiceError::EventError(msg)
            })?;

        PURCHASES_REGISTERED.inc();

        Ok(PurchaseResult {
            purchase_id,
            movements_created: applied.len(),
            total_cost,
        })
    }
}
