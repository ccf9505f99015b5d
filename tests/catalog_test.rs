mod common;

use assert_matches::assert_matches;
use factura_api::{
    commands::inventory::RecordMovementCommand, entities::stock_movement::MovementKind,
    errors::ServiceError,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn tracking_can_always_be_enabled() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::untracked_product(&app, org).await;

    let updated = app
        .catalog
        .set_inventory_tracking(org, product.id, true)
        .await
        .unwrap();
    assert!(updated.is_inventory_tracked);
}

#[tokio::test]
async fn disabling_tracking_with_live_stock_is_rejected() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    app.inventory
        .record_movement(RecordMovementCommand {
            organization_id: org,
            product_id: product.id,
            branch_id: branch.id,
            movement_type: MovementKind::Entrada,
            quantity: dec!(5),
            reference_type: None,
            reference_id: None,
            cost_price: None,
            notes: None,
        })
        .await
        .unwrap();

    let err = app
        .catalog
        .set_inventory_tracking(org, product.id, false)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // Zero the stock with a compensating adjustment, then disabling works.
    app.inventory
        .record_movement(RecordMovementCommand {
            organization_id: org,
            product_id: product.id,
            branch_id: branch.id,
            movement_type: MovementKind::Ajuste,
            quantity: dec!(-5),
            reference_type: None,
            reference_id: None,
            cost_price: None,
            notes: Some("Baja de inventario".to_string()),
        })
        .await
        .unwrap();
    let updated = app
        .catalog
        .set_inventory_tracking(org, product.id, false)
        .await
        .unwrap();
    assert!(!updated.is_inventory_tracked);
}

#[tokio::test]
async fn cross_tenant_catalog_access_is_rejected() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    let err = app
        .catalog
        .get_product(Uuid::new_v4(), product.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::OrganizationMismatch(_));

    let err = app
        .catalog
        .get_branch(Uuid::new_v4(), branch.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::OrganizationMismatch(_));
}

#[tokio::test]
async fn thresholds_require_an_existing_stock_row() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    let err = app
        .inventory
        .set_stock_thresholds(org, product.id, branch.id, Some(dec!(5)), None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    app.inventory
        .record_movement(RecordMovementCommand {
            organization_id: org,
            product_id: product.id,
            branch_id: branch.id,
            movement_type: MovementKind::Entrada,
            quantity: dec!(10),
            reference_type: None,
            reference_id: None,
            cost_price: None,
            notes: None,
        })
        .await
        .unwrap();

    let level = app
        .inventory
        .set_stock_thresholds(org, product.id, branch.id, Some(dec!(5)), Some(dec!(50)))
        .await
        .unwrap();
    assert_eq!(level.min_stock, Some(dec!(5)));
    assert_eq!(level.max_stock, Some(dec!(50)));

    let err = app
        .inventory
        .set_stock_thresholds(org, product.id, branch.id, Some(dec!(10)), Some(dec!(2)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}
