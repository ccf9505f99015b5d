pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_products_table;
mod m20240301_000002_create_branches_table;
mod m20240301_000003_create_stock_levels_table;
mod m20240301_000004_create_stock_movements_table;
mod m20240301_000005_create_inventory_settings_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_products_table::Migration),
            Box::new(m20240301_000002_create_branches_table::Migration),
            Box::new(m20240301_000003_create_stock_levels_table::Migration),
            Box::new(m20240301_000004_create_stock_movements_table::Migration),
            Box::new(m20240301_000005_create_inventory_settings_table::Migration),
        ]
    }
}
