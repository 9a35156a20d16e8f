//! Cross-cutting plumbing shared by DuckTickets services: error bodies, health
//! probes, request ids, tracing setup and small sea-orm helpers.

pub mod config;
pub mod error;
pub mod health;
pub mod middleware;
pub mod sea_ext;
pub mod serde;
pub mod tracing;
