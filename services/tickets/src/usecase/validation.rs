//! Input rules for order placement and catalog management.

use crate::domain::types::Buyer;
use crate::error::TicketsServiceError;
use crate::usecase::order::OrderLineInput;

pub const MAX_ITEMS_PER_ORDER: usize = 20;
pub const MAX_QUANTITY_PER_ITEM: u32 = 10;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let domain_ok = !domain.is_empty()
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = domain
        .rsplit_once('.')
        .is_some_and(|(host, tld)| {
            !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
        });
    local_ok && domain_ok && tld_ok
}

/// Trimmed, lower-cased email.
pub fn normalize_email(raw: &str) -> Result<String, TicketsServiceError> {
    let email = raw.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LEN || !is_valid_email(&email) {
        return Err(TicketsServiceError::validation("invalid email"));
    }
    Ok(email)
}

/// Trimmed name of 2–100 characters.
pub fn normalize_full_name(raw: &str) -> Result<String, TicketsServiceError> {
    let name = raw.trim();
    let len = name.chars().count();
    if !(2..=100).contains(&len) {
        return Err(TicketsServiceError::validation(
            "full_name must be between 2 and 100 characters",
        ));
    }
    Ok(name.to_owned())
}

/// 10–15 characters of digits, spaces, `+`, `-`, `(` and `)`. Blank means absent.
pub fn normalize_phone(raw: Option<&str>) -> Result<Option<String>, TicketsServiceError> {
    let Some(phone) = raw.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    let charset_ok = phone
        .chars()
        .all(|c| c.is_ascii_digit() || " +-()".contains(c));
    if !charset_ok || !(10..=15).contains(&phone.len()) {
        return Err(TicketsServiceError::validation("invalid phone number"));
    }
    Ok(Some(phone.to_owned()))
}

pub fn validate_buyer(
    email: &str,
    full_name: &str,
    phone: Option<&str>,
) -> Result<Buyer, TicketsServiceError> {
    Ok(Buyer {
        email: normalize_email(email)?,
        full_name: normalize_full_name(full_name)?,
        phone: normalize_phone(phone)?,
    })
}

/// 1–20 lines, each for a distinct batch with quantity 1–10.
pub fn validate_lines(lines: &[OrderLineInput]) -> Result<(), TicketsServiceError> {
    if lines.is_empty() {
        return Err(TicketsServiceError::validation("items must not be empty"));
    }
    if lines.len() > MAX_ITEMS_PER_ORDER {
        return Err(TicketsServiceError::validation(format!(
            "at most {MAX_ITEMS_PER_ORDER} items per order"
        )));
    }
    for (i, line) in lines.iter().enumerate() {
        if !(1..=MAX_QUANTITY_PER_ITEM).contains(&line.quantity) {
            return Err(TicketsServiceError::validation(format!(
                "quantity must be between 1 and {MAX_QUANTITY_PER_ITEM}"
            )));
        }
        if lines[..i].iter().any(|prev| prev.batch_id == line.batch_id) {
            return Err(TicketsServiceError::validation(
                "each ticket batch may appear only once",
            ));
        }
    }
    Ok(())
}

/// Client-supplied `Idempotency-Key`: 1–255 visible ASCII characters.
pub fn validate_idempotency_key(raw: &str) -> Result<String, TicketsServiceError> {
    let key = raw.trim();
    if key.is_empty()
        || key.len() > MAX_IDEMPOTENCY_KEY_LEN
        || !key.chars().all(|c| c.is_ascii_graphic())
    {
        return Err(TicketsServiceError::validation("invalid Idempotency-Key"));
    }
    Ok(key.to_owned())
}

/// Upper-cased code; blank means no coupon.
pub fn normalize_coupon_code(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_uppercase)
}
