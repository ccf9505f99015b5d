use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000003_create_stock_levels_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StockLevels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockLevels::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StockLevels::OrganizationId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockLevels::ProductId).uuid().not_null())
                    .col(ColumnDef::new(StockLevels::BranchId).uuid().not_null())
                    .col(
                        ColumnDef::new(StockLevels::Quantity)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StockLevels::MinStock)
                            .decimal_len(19, 4)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockLevels::MaxStock)
                            .decimal_len(19, 4)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockLevels::CostPrice)
                            .decimal_len(19, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StockLevels::LastMovementAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StockLevels::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StockLevels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockLevels::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One stock row per (product, branch); the movement ledger is the
        // only writer.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_stock_levels_product_branch")
                    .table(StockLevels::Table)
                    .col(StockLevels::ProductId)
                    .col(StockLevels::BranchId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_stock_levels_org_branch")
                    .table(StockLevels::Table)
                    .col(StockLevels::OrganizationId)
                    .col(StockLevels::BranchId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockLevels::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum StockLevels {
    Table,
    Id,
    OrganizationId,
    ProductId,
    BranchId,
    Quantity,
    MinStock,
    MaxStock,
    CostPrice,
    LastMovementAt,
    Version,
    CreatedAt,
    UpdatedAt,
}
