mod common;

use factura_api::{
    commands::inventory::{RecordMovementCommand, TransferStockCommand},
    entities::stock_movement::MovementKind,
    queries::stock_queries::{
        GetMovementHistoryQuery, GetStockByBranchQuery, ListLowStockQuery, SummarizeByBranchQuery,
    },
    queries::Query,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn seed(
    app: &common::TestApp,
    org: Uuid,
    product_id: Uuid,
    branch_id: Uuid,
    quantity: Decimal,
) {
    app.inventory
        .record_movement(RecordMovementCommand {
            organization_id: org,
            product_id,
            branch_id,
            movement_type: MovementKind::Entrada,
            quantity,
            reference_type: None,
            reference_id: None,
            cost_price: None,
            notes: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn stock_by_branch_surfaces_lowest_quantities_first() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let branch = common::branch(&app, org).await;
    let product_a = common::tracked_product(&app, org).await;
    let product_b = common::tracked_product(&app, org).await;
    let product_c = common::tracked_product(&app, org).await;
    seed(&app, org, product_a.id, branch.id, dec!(5)).await;
    seed(&app, org, product_b.id, branch.id, dec!(1)).await;
    seed(&app, org, product_c.id, branch.id, dec!(9)).await;

    let rows = GetStockByBranchQuery {
        organization_id: org,
        branch_id: branch.id,
    }
    .execute(app.db.as_ref())
    .await
    .unwrap();

    let quantities: Vec<Decimal> = rows.iter().map(|(level, _)| level.quantity).collect();
    assert_eq!(quantities, vec![dec!(1), dec!(5), dec!(9)]);
    // Product metadata is joined in.
    assert!(rows.iter().all(|(_, product)| product.is_some()));
}

#[tokio::test]
async fn low_stock_uses_min_stock_with_org_default_fallback() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let branch = common::branch(&app, org).await;
    // Quantity 3, no explicit min: low against the default threshold of 5.
    let product_default_low = common::tracked_product(&app, org).await;
    seed(&app, org, product_default_low.id, branch.id, dec!(3)).await;
    // Quantity 3, explicit min 2: not low.
    let product_explicit_ok = common::tracked_product(&app, org).await;
    seed(&app, org, product_explicit_ok.id, branch.id, dec!(3)).await;
    app.inventory
        .set_stock_thresholds(org, product_explicit_ok.id, branch.id, Some(dec!(2)), None)
        .await
        .unwrap();
    // Quantity 10, explicit min 15: low despite a healthy-looking quantity.
    let product_explicit_low = common::tracked_product(&app, org).await;
    seed(&app, org, product_explicit_low.id, branch.id, dec!(10)).await;
    app.inventory
        .set_stock_thresholds(org, product_explicit_low.id, branch.id, Some(dec!(15)), None)
        .await
        .unwrap();

    let rows = ListLowStockQuery {
        organization_id: org,
        default_threshold: dec!(5),
    }
    .execute(app.db.as_ref())
    .await
    .unwrap();

    let flagged: Vec<Uuid> = rows.iter().map(|row| row.product.id).collect();
    assert!(flagged.contains(&product_default_low.id));
    assert!(flagged.contains(&product_explicit_low.id));
    assert!(!flagged.contains(&product_explicit_ok.id));

    let default_row = rows
        .iter()
        .find(|row| row.product.id == product_default_low.id)
        .unwrap();
    assert_eq!(default_row.min_stock, dec!(5));
    assert_eq!(default_row.current_stock, dec!(3));
    assert_eq!(default_row.branch.id, branch.id);
}

#[tokio::test]
async fn branch_summary_folds_per_branch() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let branch_a = common::branch(&app, org).await;
    let branch_b = common::branch(&app, org).await;
    let empty_branch = common::branch(&app, org).await;
    let product_a = common::tracked_product(&app, org).await;
    let product_b = common::tracked_product(&app, org).await;
    seed(&app, org, product_a.id, branch_a.id, dec!(2)).await;
    seed(&app, org, product_b.id, branch_a.id, dec!(30)).await;
    seed(&app, org, product_a.id, branch_b.id, dec!(8)).await;

    let summaries = SummarizeByBranchQuery {
        organization_id: org,
        default_threshold: dec!(5),
    }
    .execute(app.db.as_ref())
    .await
    .unwrap();

    assert_eq!(summaries.len(), 3);
    let a = summaries.iter().find(|s| s.branch_id == branch_a.id).unwrap();
    assert_eq!(a.total_products, 2);
    assert_eq!(a.total_quantity, dec!(32));
    assert_eq!(a.low_stock_count, 1);
    let b = summaries.iter().find(|s| s.branch_id == branch_b.id).unwrap();
    assert_eq!(b.total_products, 1);
    assert_eq!(b.total_quantity, dec!(8));
    assert_eq!(b.low_stock_count, 0);
    let empty = summaries
        .iter()
        .find(|s| s.branch_id == empty_branch.id)
        .unwrap();
    assert_eq!(empty.total_products, 0);
    assert_eq!(empty.total_quantity, dec!(0));
}

#[tokio::test]
async fn movement_history_filters_by_reference_group() {
    let app = common::setup().await;
    let org = Uuid::new_v4();
    let product = common::tracked_product(&app, org).await;
    let source = common::branch(&app, org).await;
    let destination = common::branch(&app, org).await;
    seed(&app, org, product.id, source.id, dec!(10)).await;

    let transfer = app
        .inventory
        .transfer_stock(TransferStockCommand {
            organization_id: org,
            product_id: product.id,
            from_branch_id: source.id,
            to_branch_id: destination.id,
            quantity: dec!(4),
            notes: None,
        })
        .await
        .unwrap();

    let group = GetMovementHistoryQuery {
        organization_id: org,
        product_id: None,
        branch_id: None,
        reference_id: Some(transfer.transfer_id),
        limit: 50,
        offset: 0,
    }
    .execute(app.db.as_ref())
    .await
    .unwrap();
    assert_eq!(group.len(), 2);

    let all = GetMovementHistoryQuery {
        organization_id: org,
        product_id: Some(product.id),
        branch_id: None,
        reference_id: None,
        limit: 50,
        offset: 0,
    }
    .execute(app.db.as_ref())
    .await
    .unwrap();
    assert_eq!(all.len(), 3);

    // Other tenants see nothing.
    let foreign = GetMovementHistoryQuery {
        organization_id: Uuid::new_v4(),
        product_id: None,
        branch_id: None,
        reference_id: None,
        limit: 50,
        offset: 0,
    }
    .execute(app.db.as_ref())
    .await
    .unwrap();
    assert!(foreign.is_empty());
}
