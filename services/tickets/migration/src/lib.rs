use sea_orm_migration::prelude::*;

mod m20260401_000001_create_events;
mod m20260401_000002_create_ticket_batches;
mod m20260401_000003_create_coupons;
mod m20260401_000004_create_orders;
mod m20260401_000005_create_order_items;
mod m20260401_000006_create_attendees;
mod m20260401_000007_create_payments;
mod m20260401_000008_create_idempotency_keys;
mod m20260401_000009_create_outbox_events;
mod m20260401_000010_add_request_hash;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260401_000001_create_events::Migration),
            Box::new(m20260401_000002_create_ticket_batches::Migration),
            Box::new(m20260401_000003_create_coupons::Migration),
            Box::new(m20260401_000004_create_orders::Migration),
            Box::new(m20260401_000005_create_order_items::Migration),
            Box::new(m20260401_000006_create_attendees::Migration),
            Box::new(m20260401_000007_create_payments::Migration),
            Box::new(m20260401_000008_create_idempotency_keys::Migration),
            Box::new(m20260401_000009_create_outbox_events::Migration),
            Box::new(m20260401_000010_add_request_hash::Migration),
        ]
    }
}
