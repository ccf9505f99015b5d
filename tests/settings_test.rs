mod common;

use assert_matches::assert_matches;
use factura_api::{
    commands::inventory::RecordMovementCommand,
    entities::stock_movement::{self, MovementKind, ReferenceKind},
    errors::ServiceError,
    services::{inventory::InvoiceLine, settings::SettingsPatch},
};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

#[tokio::test]
async fn missing_row_reads_as_defaults() {
    let app = common::setup().await;
    let org = Uuid::new_v4();

    let settings = app.settings.effective(org).await.unwrap();
    assert!(settings.inventory_enabled);
    assert!(settings.require_stock_validation);
    assert!(!settings.auto_deduct_on_invoice);
    assert_eq!(settings.low_stock_threshold, dec!(5));
}

#[tokio::test]
async fn update_is_last_write_wins() {
    let app = common::setup().await;
    let org = Uuid::new_v4();

    app.settings
        .update(
            org,
            SettingsPatch {
                low_stock_threshold: Some(dec!(12)),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap();
    let updated = app
        .settings
        .update(
            org,
            SettingsPatch {
                auto_deduct_on_invoice: Some(true),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap();

    // Unpatched fields keep their stored values.
    assert_eq!(updated.low_stock_threshold, dec!(12));
    assert!(updated.auto_deduct_on_invoice);
}

#[tokio::test]
async fn negative_threshold_is_rejected() {
    let app = common::setup().await;
    let err = app
        .settings
        .update(
            Uuid::new_v4(),
            SettingsPatch {
                low_stock_threshold: Some(dec!(-1)),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn invoice_deduction_is_gated_by_auto_deduct_flag() {
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
            quantity: dec!(10),
            reference_type: None,
            reference_id: None,
            cost_price: None,
            notes: None,
        })
        .await
        .unwrap();

    let invoice_id = Uuid::new_v4();
    let lines = vec![InvoiceLine {
        product_id: product.id,
        branch_id: branch.id,
        quantity: dec!(4),
    }];

    // Flag off: nothing happens.
    let results = app
        .inventory
        .deduct_for_invoice(org, invoice_id, &lines)
        .await
        .unwrap();
    assert!(results.is_empty());
    let level = app
        .inventory
        .get_stock_level(org, product.id, branch.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(level.quantity, dec!(10));

    // Flag on: one salida per tracked line, referencing the invoice.
    app.settings
        .update(
            org,
            SettingsPatch {
                auto_deduct_on_invoice: Some(true),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap();
    let results = app
        .inventory
        .deduct_for_invoice(org, invoice_id, &lines)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].stock_level.quantity, dec!(6));
    assert_eq!(
        results[0].movement.reference_type.as_deref(),
        Some(ReferenceKind::Factura.as_str())
    );
    assert_eq!(results[0].movement.reference_id, Some(invoice_id));
}

#[tokio::test]
async fn invoice_deduction_skips_untracked_lines() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let tracked = common::tracked_product(&app, org).await;
    let untracked = common::untracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    app.settings
        .update(
            org,
            SettingsPatch {
                auto_deduct_on_invoice: Some(true),
                require_stock_validation: Some(false),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap();

    let invoice_id = Uuid::new_v4();
    let results = app
        .inventory
        .deduct_for_invoice(
            org,
            invoice_id,
            &[
                InvoiceLine {
                    product_id: tracked.id,
                    branch_id: branch.id,
                    quantity: dec!(2),
                },
                InvoiceLine {
                    product_id: untracked.id,
                    branch_id: branch.id,
                    quantity: dec!(3),
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].movement.product_id, tracked.id);
}

#[tokio::test]
async fn invoice_restock_compensates_a_deleted_invoice() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let branch = common::branch(&app, org).await;

    app.settings
        .update(
            org,
            SettingsPatch {
                auto_deduct_on_invoice: Some(true),
                ..SettingsPatch::default()
            },
        )
        .await
        .unwrap();

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

    let invoice_id = Uuid::new_v4();
    let lines = vec![InvoiceLine {
        product_id: product.id,
        branch_id: branch.id,
        quantity: dec!(4),
    }];
    app.inventory
        .deduct_for_invoice(org, invoice_id, &lines)
        .await
        .unwrap();
    app.inventory
        .restock_for_invoice(org, invoice_id, &lines)
        .await
        .unwrap();

    let level = app
        .inventory
        .get_stock_level(org, product.id, branch.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(level.quantity, dec!(10));

    // Both sides of the invoice history share the factura reference.
    let invoice_movements = stock_movement::Entity::find()
        .filter(stock_movement::Column::ReferenceId.eq(invoice_id))
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert_eq!(invoice_movements.len(), 2);
}
