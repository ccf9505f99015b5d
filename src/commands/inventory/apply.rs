//! Transaction-scoped movement application.
//!
//! Every mutating inventory command bottoms out here: one ledger insert and
//! one stock-level update, inside the caller's open transaction. The stock
//! row is locked for the duration, so per-(product, branch) movements are
//! linearized and the previous/new quantity chain stays intact.

use crate::entities::{
    branch, product, stock_level,
    stock_movement::{self, MovementKind, ReferenceKind},
};
use crate::errors::ServiceError;
use crate::services::settings::EffectiveSettings;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
};
use uuid::Uuid;

/// One requested quantity change against a (product, branch) pair.
#[derive(Debug, Clone)]
pub struct MovementSpec {
    pub organization_id: Uuid,
    pub product_id: Uuid,
    pub branch_id: Uuid,
    pub kind: MovementKind,
    pub quantity: Decimal,
    pub reference: Option<(ReferenceKind, Uuid)>,
    pub cost_price: Option<Decimal>,
    pub notes: Option<String>,
}

/// The paired writes produced by a successful apply.
#[derive(Debug, Clone)]
pub struct AppliedMovement {
    pub movement: stock_movement::Model,
    pub stock_level: stock_level::Model,
}

/// Quantity-weighted average of the existing stock cost and an incoming lot.
/// Retains the old cost when the combined quantity is not positive.
pub fn weighted_average_cost(
    old_quantity: Decimal,
    old_cost: Decimal,
    added_quantity: Decimal,
    added_cost: Decimal,
) -> Decimal {
    let combined = old_quantity + added_quantity;
    if combined <= Decimal::ZERO {
        return old_cost;
    }
    ((old_quantity * old_cost + added_quantity * added_cost) / combined).round_dp(4)
}

/// Applies one movement inside the caller's transaction.
///
/// Validates tenant ownership, tracking flag, sign discipline and the
/// stock-validation policy, then writes the ledger row and the stock update
/// together. Callers own transaction boundaries and conflict retries.
pub async fn apply_movement<C>(
    conn: &C,
    settings: &EffectiveSettings,
    spec: &MovementSpec,
) -> Result<AppliedMovement, ServiceError>
where
    C: ConnectionTrait,
{
    if spec.quantity.is_zero() {
        return Err(ServiceError::InvalidInput(
            "movement quantity must be nonzero".to_string(),
        ));
    }
    if !spec.kind.permits_delta(spec.quantity) {
        return Err(ServiceError::InvalidMovementType(format!(
            "movement type {} does not permit quantity {}",
            spec.kind.as_str(),
            spec.quantity
        )));
    }
    if let Some(cost) = spec.cost_price {
        if cost < Decimal::ZERO {
            return Err(ServiceError::InvalidInput(format!(
                "cost price cannot be negative: {}",
                cost
            )));
        }
    }

    let product = product::Entity::find_by_id(spec.product_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("product {}", spec.product_id)))?;
    if product.organization_id != spec.organization_id {
        return Err(ServiceError::OrganizationMismatch(format!(
            "product {}",
            spec.product_id
        )));
    }
    if !product.is_inventory_tracked {
        return Err(ServiceError::NotFound(format!(
            "product {} is not inventory tracked",
            spec.product_id
        )));
    }

    let branch = branch::Entity::find_by_id(spec.branch_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("branch {}", spec.branch_id)))?;
    if branch.organization_id != spec.organization_id {
        return Err(ServiceError::OrganizationMismatch(format!(
            "branch {}",
            spec.branch_id
        )));
    }
    if !branch.is_active {
        return Err(ServiceError::NotFound(format!(
            "branch {} is inactive",
            spec.branch_id
        )));
    }

    let now = Utc::now();

    // Exclusive lock on the stock row for the rest of the transaction; the
    // row is created lazily on the first movement for the pair.
    let existing = stock_level::Entity::find()
        .filter(stock_level::Column::ProductId.eq(spec.product_id))
        .filter(stock_level::Column::BranchId.eq(spec.branch_id))
        .lock_exclusive()
        .one(conn)
        .await?;

    let level = match existing {
        Some(level) => level,
        None => {
            let fresh = stock_level::ActiveModel {
                id: Set(Uuid::new_v4()),
                organization_id: Set(spec.organization_id),
                product_id: Set(spec.product_id),
                branch_id: Set(spec.branch_id),
                quantity: Set(Decimal::ZERO),
                min_stock: Set(None),
                max_stock: Set(None),
                cost_price: Set(Decimal::ZERO),
                last_movement_at: Set(None),
                version: Set(0),
                created_at: Set(now),
                updated_at: Set(now),
            };
            fresh.insert(conn).await?
        }
    };

    let previous_quantity = level.quantity;
    let new_quantity = previous_quantity + spec.quantity;

    if settings.inventory_enabled
        && settings.require_stock_validation
        && spec.quantity < Decimal::ZERO
        && new_quantity < Decimal::ZERO
    {
        return Err(ServiceError::InsufficientStock(format!(
            "product {} at branch {}: requested {}, available {}",
            spec.product_id,
            spec.branch_id,
            spec.quantity.abs(),
            previous_quantity
        )));
    }

    let mut cost_price = level.cost_price;
    if let Some(unit_cost) = spec.cost_price {
        if spec.quantity > Decimal::ZERO {
            cost_price =
                weighted_average_cost(previous_quantity, level.cost_price, spec.quantity, unit_cost);
        }
    }

    let movement = stock_movement::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(spec.organization_id),
        product_id: Set(spec.product_id),
        branch_id: Set(spec.branch_id),
        movement_type: Set(spec.kind.as_str().to_string()),
        quantity: Set(spec.quantity),
        previous_quantity: Set(previous_quantity),
        new_quantity: Set(new_quantity),
        reference_type: Set(spec.reference.map(|(kind, _)| kind.as_str().to_string())),
        reference_id: Set(spec.reference.map(|(_, id)| id)),
        cost_price: Set(spec.cost_price),
        notes: Set(spec.notes.clone()),
        movement_date: Set(now),
        created_at: Set(now),
    }
    .insert(conn)
    .await?;

    let mut update: stock_level::ActiveModel = level.clone().into();
    update.quantity = Set(new_quantity);
    update.cost_price = Set(cost_price);
    update.last_movement_at = Set(Some(now));
    update.version = Set(level.version + 1);
    update.updated_at = Set(now);
    let stock_level = update.update(conn).await?;

    Ok(AppliedMovement {
        movement,
        stock_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn weighted_average_blends_by_quantity() {
        // 10 units at 2.00 plus 10 units at 4.00 averages to 3.00
        assert_eq!(
            weighted_average_cost(dec!(10), dec!(2.00), dec!(10), dec!(4.00)),
            dec!(3.00)
        );
    }

    #[test]
    fn weighted_average_on_empty_stock_takes_incoming_cost() {
        assert_eq!(
            weighted_average_cost(dec!(0), dec!(0), dec!(5), dec!(7.50)),
            dec!(7.50)
        );
    }

    #[test]
    fn weighted_average_keeps_old_cost_when_combined_not_positive() {
        // Negative stock plus a smaller receipt: no meaningful blend exists.
        assert_eq!(
            weighted_average_cost(dec!(-10), dec!(2.00), dec!(5), dec!(9.00)),
            dec!(2.00)
        );
    }

    #[test]
    fn weighted_average_rounds_to_column_scale() {
        let cost = weighted_average_cost(dec!(3), dec!(1.00), dec!(7), dec!(2.00));
        assert_eq!(cost, dec!(1.7000));
    }
}
