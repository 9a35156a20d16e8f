use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attendees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attendees::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attendees::OrderId).uuid().not_null())
                    .col(ColumnDef::new(Attendees::TicketBatchId).uuid().not_null())
                    .col(ColumnDef::new(Attendees::FullName).string_len(200).not_null())
                    .col(ColumnDef::new(Attendees::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Attendees::Phone).string_len(20))
                    .col(ColumnDef::new(Attendees::Token).string_len(255).unique_key())
                    .col(
                        ColumnDef::new(Attendees::CheckedIn)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Attendees::CheckedInAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Attendees::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Attendees::Table, Attendees::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Attendees::Table, Attendees::TicketBatchId)
                            .to(TicketBatches::Table, TicketBatches::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Attendees::Table)
                    .col(Attendees::OrderId)
                    .name("idx_attendees_order_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attendees::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Attendees {
    Table,
    Id,
    OrderId,
    TicketBatchId,
    FullName,
    Email,
    Phone,
    Token,
    CheckedIn,
    CheckedInAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum TicketBatches {
    Table,
    Id,
}
