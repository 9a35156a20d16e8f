use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(ducktickets_tickets_migration::Migrator).await;
}
