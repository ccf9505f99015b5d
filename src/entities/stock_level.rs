use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current stock for one (product, branch) pair.
///
/// `quantity` is derived state: it always equals the running sum of the
/// stock_movements ledger for the pair and is only ever written in the same
/// transaction as a ledger insert.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_levels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub product_id: Uuid,
    pub branch_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub min_stock: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub max_stock: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub cost_price: Decimal,
    pub last_movement_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::branch::Entity",
        from = "Column::BranchId",
        to = "super::branch::Column::Id"
    )]
    Branch,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::branch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branch.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Low-stock rule: explicit `min_stock` wins, otherwise the organization
    /// default threshold applies.
    pub fn is_low_stock(&self, default_threshold: Decimal) -> bool {
        self.quantity <= self.min_stock.unwrap_or(default_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn level(quantity: Decimal, min_stock: Option<Decimal>) -> Model {
        Model {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            quantity,
            min_stock,
            max_stock: None,
            cost_price: Decimal::ZERO,
            last_movement_at: None,
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn explicit_min_stock_overrides_default() {
        assert!(level(dec!(3), Some(dec!(5))).is_low_stock(dec!(1)));
        assert!(!level(dec!(3), Some(dec!(2))).is_low_stock(dec!(10)));
    }

    #[test]
    fn default_threshold_applies_without_min_stock() {
        assert!(level(dec!(5), None).is_low_stock(dec!(5)));
        assert!(!level(dec!(6), None).is_low_stock(dec!(5)));
    }
}
