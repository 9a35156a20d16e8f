//! sea-orm repositories over Postgres.

mod attendees;
mod catalog;
mod idempotency;
mod orders;
mod outbox;
mod payments;

pub use attendees::DbAttendeeRepository;
pub use catalog::DbCatalogRepository;
pub use idempotency::DbIdempotencyStore;
pub use orders::DbOrderRepository;
pub use outbox::DbOutboxRepository;
pub use payments::DbPaymentRepository;

use anyhow::anyhow;

use ducktickets_domain::order::OrderStatus;
use ducktickets_domain::payment::PaymentStatus;

/// Non-negative integer column to `u32`.
fn to_u32(value: i32, column: &str) -> anyhow::Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("negative {column}: {value}"))
}

/// `u32` domain count to an `INTEGER` column.
fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn order_status(raw: &str) -> anyhow::Result<OrderStatus> {
    OrderStatus::parse(raw).ok_or_else(|| anyhow!("unknown order status {raw:?}"))
}

fn payment_status(raw: &str) -> anyhow::Result<PaymentStatus> {
    PaymentStatus::parse(raw).ok_or_else(|| anyhow!("unknown payment status {raw:?}"))
}
