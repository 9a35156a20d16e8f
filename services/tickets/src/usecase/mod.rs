pub mod buyer;
pub mod catalog;
pub mod checkin;
pub mod idempotency;
pub mod order;
pub mod payment;
pub mod report;
pub mod ticket;
pub mod validation;
pub mod work;
