use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Entrada,
    Salida,
    Ajuste,
    TransferenciaEntrada,
    TransferenciaSalida,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entrada => "entrada",
            MovementKind::Salida => "salida",
            MovementKind::Ajuste => "ajuste",
            MovementKind::TransferenciaEntrada => "transferencia_entrada",
            MovementKind::TransferenciaSalida => "transferencia_salida",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "entrada" => Some(MovementKind::Entrada),
            "salida" => Some(MovementKind::Salida),
            "ajuste" => Some(MovementKind::Ajuste),
            "transferencia_entrada" => Some(MovementKind::TransferenciaEntrada),
            "transferencia_salida" => Some(MovementKind::TransferenciaSalida),
            _ => None,
        }
    }

    /// Sign discipline for the signed quantity column: entries are positive,
    /// exits negative, adjustments either sign but never zero.
    pub fn permits_delta(&self, delta: Decimal) -> bool {
        match self {
            MovementKind::Entrada | MovementKind::TransferenciaEntrada => delta > Decimal::ZERO,
            MovementKind::Salida | MovementKind::TransferenciaSalida => delta < Decimal::ZERO,
            MovementKind::Ajuste => !delta.is_zero(),
        }
    }
}

/// What a movement group refers back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Compra,
    Ajuste,
    Transferencia,
    Factura,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Compra => "compra",
            ReferenceKind::Ajuste => "ajuste",
            ReferenceKind::Transferencia => "transferencia",
            ReferenceKind::Factura => "factura",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "compra" => Some(ReferenceKind::Compra),
            "ajuste" => Some(ReferenceKind::Ajuste),
            "transferencia" => Some(ReferenceKind::Transferencia),
            "factura" => Some(ReferenceKind::Factura),
            _ => None,
        }
    }
}

/// Append-only ledger row. Invariant: `new_quantity = previous_quantity +
/// quantity`, and within one (product, branch) pair each row's
/// `previous_quantity` equals the preceding row's `new_quantity`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub product_id: Uuid,
    pub branch_id: Uuid,
    pub movement_type: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub previous_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub new_quantity: Decimal,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub cost_price: Option<Decimal>,
    pub notes: Option<String>,
    pub movement_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn kind(&self) -> Option<MovementKind> {
        MovementKind::parse_str(&self.movement_type)
    }
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

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
