//! Staff authentication shared across DuckTickets crates.
//!
//! Provides JWT validation (and, behind the `ISSUER` feature, minting) plus the
//! `StaffIdentity` extractor used by protected handlers.

pub mod identity;
pub mod token;
