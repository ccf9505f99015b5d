use crate::{
    db::DbPool,
    entities::{stock_level, stock_movement},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// One stock row whose stored quantity disagrees with its ledger, or whose
/// ledger chain is broken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockDiscrepancy {
    pub product_id: Uuid,
    pub branch_id: Uuid,
    pub stored_quantity: Decimal,
    pub replayed_quantity: Decimal,
    /// First movement whose previous/new link does not line up
    pub chain_broken_at: Option<Uuid>,
}

/// Outcome of replaying one (product, branch) ledger in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainReplay {
    pub final_quantity: Decimal,
    pub broken_at: Option<Uuid>,
}

/// Folds a movement chain, verifying both per-row arithmetic
/// (`new = previous + quantity`) and the causal link between consecutive
/// rows. Movements must already be ordered.
pub fn replay_chain(movements: &[stock_movement::Model]) -> ChainReplay {
    let mut running = Decimal::ZERO;
    let mut broken_at = None;
    for (index, movement) in movements.iter().enumerate() {
        let arithmetic_holds =
            movement.new_quantity == movement.previous_quantity + movement.quantity;
        let link_holds = index == 0 || movement.previous_quantity == running;
        if broken_at.is_none() && (!arithmetic_holds || !link_holds) {
            broken_at = Some(movement.id);
        }
        running = if index == 0 {
            movement.new_quantity
        } else {
            running + movement.quantity
        };
    }
    ChainReplay {
        final_quantity: running,
        broken_at,
    }
}

/// Periodic self-check: recomputes every stock quantity from its movement
/// ledger and flags divergence. This is the authoritative check for the
/// invariant that stock equals the ledger fold; the live read paths never
/// replay.
#[derive(Clone)]
pub struct ReconciliationService {
    db: Arc<DbPool>,
}

impl ReconciliationService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn reconcile_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<StockDiscrepancy>, ServiceError> {
        let levels = stock_level::Entity::find()
            .filter(stock_level::Column::OrganizationId.eq(organization_id))
            .all(self.db.as_ref())
            .await?;

        let mut discrepancies = Vec::new();
        for level in levels {
            let movements = stock_movement::Entity::find()
                .filter(stock_movement::Column::ProductId.eq(level.product_id))
                .filter(stock_movement::Column::BranchId.eq(level.branch_id))
                .order_by_asc(stock_movement::Column::CreatedAt)
                .order_by_asc(stock_movement::Column::Id)
                .all(self.db.as_ref())
                .await?;

            let replay = replay_chain(&movements);
            if replay.final_quantity != level.quantity || replay.broken_at.is_some() {
                warn!(
                    product_id = %level.product_id,
                    branch_id = %level.branch_id,
                    stored = %level.quantity,
                    replayed = %replay.final_quantity,
                    chain_broken_at = ?replay.broken_at,
                    "Stock level diverges from movement ledger"
                );
                discrepancies.push(StockDiscrepancy {
                    product_id: level.product_id,
                    branch_id: level.branch_id,
                    stored_quantity: level.quantity,
                    replayed_quantity: replay.final_quantity,
                    chain_broken_at: replay.broken_at,
                });
            }
        }

        info!(
            organization_id = %organization_id,
            discrepancies = discrepancies.len(),
            "Reconciliation pass complete"
        );
        Ok(discrepancies)
    }
}
