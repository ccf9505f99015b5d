mod common;

use assert_matches::assert_matches;
use factura_api::{
    commands::inventory::RecordMovementCommand,
    entities::stock_movement::{self, MovementKind},
    errors::ServiceError,
    services::settings::SettingsPatch,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

fn movement(
    organization_id: Uuid,
    product_id: Uuid,
    branch_id: Uuid,
    kind: MovementKind,
    quantity: Decimal,
) -> RecordMovementCommand {
    RecordMovementCommand {
        organization_id,
        product_id,
        branch_id,
        movement_type: kind,
        quantity,
        reference_type: None,
        reference_id: None,
        cost_price: None,
        notes: None,
    }
}

#[tokio::test]
async fn first_movement_creates_stock_level_lazily() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    assert!(app
        .inventory
        .get_stock_level(org, product.id, branch.id)
        .await
        .unwrap()
        .is_none());

    let result = app
        .inventory
        .record_movement(movement(org, product.id, branch.id, MovementKind::Entrada, dec!(10)))
        .await
        .unwrap();

    assert_eq!(result.stock_level.quantity, dec!(10));
    assert_eq!(result.movement.previous_quantity, dec!(0));
    assert_eq!(result.movement.new_quantity, dec!(10));
    assert!(result.stock_level.last_movement_at.is_some());
}

#[tokio::test]
async fn salida_reduces_quantity_and_chains() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    app.inventory
        .record_movement(movement(org, product.id, branch.id, MovementKind::Entrada, dec!(10)))
        .await
        .unwrap();
    let result = app
        .inventory
        .record_movement(movement(org, product.id, branch.id, MovementKind::Salida, dec!(-3)))
        .await
        .unwrap();

    assert_eq!(result.movement.previous_quantity, dec!(10));
    assert_eq!(result.movement.new_quantity, dec!(7));
    assert_eq!(result.stock_level.quantity, dec!(7));
}

#[tokio::test]
async fn insufficient_stock_is_rejected_without_mutation() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    app.inventory
        .record_movement(movement(org, product.id, branch.id, MovementKind::Entrada, dec!(7)))
        .await
        .unwrap();

    let err = app
        .inventory
        .record_movement(movement(org, product.id, branch.id, MovementKind::Salida, dec!(-8)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    let level = app
        .inventory
        .get_stock_level(org, product.id, branch.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(level.quantity, dec!(7));

    let ledger = stock_movement::Entity::find()
        .filter(stock_movement::Column::ProductId.eq(product.id))
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert_eq!(ledger.len(), 1, "rejected movement must not reach the ledger");
}

#[tokio::test]
async fn validation_off_allows_negative_quantity() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    app.settings
        .update(
            org,
            SettingsPatch {
                require_stock_validation: Some(false),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap();

    let result = app
        .inventory
        .record_movement(movement(org, product.id, branch.id, MovementKind::Salida, dec!(-8)))
        .await
        .unwrap();
    assert_eq!(result.stock_level.quantity, dec!(-8));
}

#[tokio::test]
async fn inventory_disabled_skips_validation() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    app.settings
        .update(
            org,
            SettingsPatch {
                inventory_enabled: Some(false),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap();

    let result = app
        .inventory
        .record_movement(movement(org, product.id, branch.id, MovementKind::Salida, dec!(-2)))
        .await
        .unwrap();
    assert_eq!(result.stock_level.quantity, dec!(-2));
}

#[tokio::test]
async fn untracked_product_is_not_found() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::untracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    let err = app
        .inventory
        .record_movement(movement(org, product.id, branch.id, MovementKind::Entrada, dec!(5)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn cross_tenant_product_is_rejected() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let other_org = Uuid::new_v4();
    let product = common::tracked_product(&app, other_org).await;
    let branch = common::branch(&app, org).await;

    let err = app
        .inventory
        .record_movement(movement(org, product.id, branch.id, MovementKind::Entrada, dec!(5)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::OrganizationMismatch(_));
}

#[tokio::test]
async fn wrong_sign_is_invalid_movement_type() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    let err = app
        .inventory
        .record_movement(movement(org, product.id, branch.id, MovementKind::Entrada, dec!(-5)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidMovementType(_));

    let err = app
        .inventory
        .record_movement(movement(org, product.id, branch.id, MovementKind::Salida, dec!(5)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidMovementType(_));
}

#[tokio::test]
async fn zero_quantity_is_invalid_input() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    let err = app
        .inventory
        .record_movement(movement(org, product.id, branch.id, MovementKind::Ajuste, dec!(0)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn incoming_cost_updates_weighted_average() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    let mut first = movement(org, product.id, branch.id, MovementKind::Entrada, dec!(10));
    first.cost_price = Some(dec!(2.00));
    app.inventory.record_movement(first).await.unwrap();

    let mut second = movement(org, product.id, branch.id, MovementKind::Entrada, dec!(10));
    second.cost_price = Some(dec!(4.00));
    let result = app.inventory.record_movement(second).await.unwrap();

    assert_eq!(result.stock_level.quantity, dec!(20));
    assert_eq!(result.stock_level.cost_price, dec!(3.00));
}

#[tokio::test]
async fn outgoing_cost_does_not_change_average() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    let mut first = movement(org, product.id, branch.id, MovementKind::Entrada, dec!(10));
    first.cost_price = Some(dec!(2.00));
    app.inventory.record_movement(first).await.unwrap();

    let mut out = movement(org, product.id, branch.id, MovementKind::Salida, dec!(-4));
    out.cost_price = Some(dec!(9.00));
    let result = app.inventory.record_movement(out).await.unwrap();
    assert_eq!(result.stock_level.cost_price, dec!(2.00));
}

#[tokio::test]
async fn ledger_forms_a_strict_chain() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    for (kind, qty) in [
        (MovementKind::Entrada, dec!(10)),
        (MovementKind::Salida, dec!(-3)),
        (MovementKind::Ajuste, dec!(2)),
        (MovementKind::Salida, dec!(-1)),
    ] {
        app.inventory
            .record_movement(movement(org, product.id, branch.id, kind, qty))
            .await
            .unwrap();
    }

    let ledger = stock_movement::Entity::find()
        .filter(stock_movement::Column::ProductId.eq(product.id))
        .filter(stock_movement::Column::BranchId.eq(branch.id))
        .order_by_asc(stock_movement::Column::CreatedAt)
        .order_by_asc(stock_movement::Column::Id)
        .all(app.db.as_ref())
        .await
        .unwrap();

    assert_eq!(ledger.len(), 4);
    for pair in ledger.windows(2) {
        assert_eq!(pair[1].previous_quantity, pair[0].new_quantity);
    }
    for entry in &ledger {
        assert_eq!(entry.new_quantity, entry.previous_quantity + entry.quantity);
    }

    let level = app
        .inventory
        .get_stock_level(org, product.id, branch.id)
        .await
        .unwrap()
        .unwrap();
    let ledger_sum: Decimal = ledger.iter().map(|m| m.quantity).sum();
    assert_eq!(level.quantity, ledger_sum);
    assert_eq!(level.quantity, ledger.last().unwrap().new_quantity);
}
