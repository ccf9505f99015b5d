#![allow(dead_code)]

use factura_api::{
    entities::product,
    events::{self, EventSender},
    retry::RetryConfig,
    services::{
        catalog::{CatalogService, NewBranch, NewProduct},
        inventory::InventoryService,
        reconciliation::ReconciliationService,
        settings::InventorySettingsService,
    },
};
use migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub event_sender: EventSender,
    pub inventory: InventoryService,
    pub settings: Arc<InventorySettingsService>,
    pub catalog: CatalogService,
    pub reconciliation: ReconciliationService,
}

/// Fresh in-memory database with migrations applied and services wired the
/// way `main` wires them. A single pooled connection keeps every test
/// hitting the same in-memory database.
pub async fn setup() -> TestApp {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);
    let db = Database::connect(options).await.expect("sqlite connect");
    Migrator::up(&db, None).await.expect("migrations");
    let db = Arc::new(db);

    let (event_sender, event_rx) = events::channel(256);
    tokio::spawn(events::process_events(event_rx));

    // Zero TTL so settings updates are visible immediately.
    let settings = Arc::new(InventorySettingsService::new(
        db.clone(),
        event_sender.clone(),
        Duration::from_secs(0),
    ));
    let inventory = InventoryService::new(
        db.clone(),
        event_sender.clone(),
        settings.clone(),
        RetryConfig::default(),
    );
    let catalog = CatalogService::new(db.clone());
    let reconciliation = ReconciliationService::new(db.clone());

    TestApp {
        db,
        event_sender,
        inventory,
        settings,
        catalog,
        reconciliation,
    }
}

pub async fn tracked_product(app: &TestApp, organization_id: Uuid) -> product::Model {
    app.catalog
        .create_product(NewProduct {
            organization_id,
            name: "Cafe molido 500g".to_string(),
            sku: format!("SKU-{}", Uuid::new_v4()),
            unit_of_measure: "unidad".to_string(),
            is_inventory_tracked: true,
        })
        .await
        .expect("create product")
}

pub async fn untracked_product(app: &TestApp, organization_id: Uuid) -> product::Model {
    app.catalog
        .create_product(NewProduct {
            organization_id,
            name: "Servicio de envio".to_string(),
            sku: format!("SKU-{}", Uuid::new_v4()),
            unit_of_measure: "unidad".to_string(),
            is_inventory_tracked: false,
        })
        .await
        .expect("create product")
}

pub async fn branch(app: &TestApp, organization_id: Uuid) -> factura_api::entities::branch::Model {
    app.catalog
        .create_branch(NewBranch {
            organization_id,
            name: "Sucursal Centro".to_string(),
        })
        .await
        .expect("create branch")
}
