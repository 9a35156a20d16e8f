use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TicketBatches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketBatches::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TicketBatches::EventId).uuid().not_null())
                    .col(ColumnDef::new(TicketBatches::Name).string_len(100).not_null())
                    .col(ColumnDef::new(TicketBatches::Description).text())
                    .col(
                        ColumnDef::new(TicketBatches::Price)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TicketBatches::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(TicketBatches::SoldQuantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TicketBatches::SaleStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketBatches::SaleEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketBatches::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TicketBatches::RequiresCoupon)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TicketBatches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(
                        Expr::col(TicketBatches::SoldQuantity)
                            .lte(Expr::col(TicketBatches::Quantity))
                            .and(Expr::col(TicketBatches::SoldQuantity).gte(0)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TicketBatches::Table, TicketBatches::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(TicketBatches::Table)
                    .col(TicketBatches::EventId)
                    .name("idx_ticket_batches_event_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TicketBatches::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TicketBatches {
    Table,
    Id,
    EventId,
    Name,
    Description,
    Price,
    Quantity,
    SoldQuantity,
    SaleStart,
    SaleEnd,
    IsActive,
    RequiresCoupon,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
}
