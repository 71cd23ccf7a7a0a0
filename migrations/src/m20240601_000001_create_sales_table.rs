use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240601_000001_create_sales_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sales::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sales::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Sales::ProductId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sales::SaleDate).date().not_null())
                    .col(ColumnDef::new(Sales::Quantity).integer().not_null())
                    .to_owned(),
            )
            .await?;

        // The forecast pipeline always filters by product and orders by date.
        manager
            .create_index(
                Index::create()
                    .name("idx_sales_product_date")
                    .table(Sales::Table)
                    .col(Sales::ProductId)
                    .col(Sales::SaleDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Sales::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Sales {
    Table,
    Id,
    ProductId,
    SaleDate,
    Quantity,
}
