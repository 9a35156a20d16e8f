//! Idempotency keys and request fingerprints for order creation.

use sha2::{Digest, Sha256};

use ducktickets_domain::id::EventId;

use crate::domain::types::Buyer;
use crate::usecase::order::OrderLineInput;
use crate::usecase::validation::normalize_coupon_code;

/// SHA-256 hex over the normalized buyer, event and lines. Lines are sorted by
/// batch id so that item order in the request does not matter.
///
/// Doubles as the idempotency key when the client sends none, and as the
/// fingerprint a replayed key must match.
pub fn derive_key(buyer: &Buyer, event_id: EventId, lines: &[OrderLineInput]) -> String {
    let mut normalized: Vec<String> = lines
        .iter()
        .map(|line| {
            format!(
                "{}x{}:{}",
                line.batch_id,
                line.quantity,
                normalize_coupon_code(line.coupon_code.as_deref()).unwrap_or_default()
            )
        })
        .collect();
    normalized.sort();

    let material = format!(
        "{}\n{}\n{}\n{}\n{}",
        buyer.email,
        buyer.full_name,
        buyer.phone.as_deref().unwrap_or_default(),
        event_id,
        normalized.join(",")
    );
    hex::encode(Sha256::digest(material.as_bytes()))
}

/// Namespace a client `Idempotency-Key` to the buyer and event, so two
/// buyers picking the same header value never share a slot.
pub fn scope_client_key(email: &str, event_id: EventId, client_key: &str) -> String {
    let material = format!("{email}:{event_id}:{client_key}");
    hex::encode(Sha256::digest(material.as_bytes()))
}
