//! sea-orm entities for the tickets service database.

pub mod attendees;
pub mod coupons;
pub mod events;
pub mod idempotency_keys;
pub mod order_items;
pub mod orders;
pub mod outbox_events;
pub mod payments;
pub mod ticket_batches;
