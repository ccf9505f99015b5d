use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000005_create_inventory_settings_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventorySettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventorySettings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InventorySettings::OrganizationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventorySettings::InventoryEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(InventorySettings::LowStockThreshold)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(InventorySettings::AutoDeductOnInvoice)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(InventorySettings::RequireStockValidation)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(InventorySettings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventorySettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_inventory_settings_org")
                    .table(InventorySettings::Table)
                    .col(InventorySettings::OrganizationId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventorySettings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum InventorySettings {
    Table,
    Id,
    OrganizationId,
    InventoryEnabled,
    LowStockThreshold,
    AutoDeductOnInvoice,
    RequireStockValidation,
    CreatedAt,
    UpdatedAt,
}
