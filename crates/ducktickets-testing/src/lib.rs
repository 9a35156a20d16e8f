//! Test utilities for DuckTickets services.
//!
//! Dev-dependency only.

pub mod auth;
