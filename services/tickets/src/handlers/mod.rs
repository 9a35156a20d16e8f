pub mod admin;
pub mod buyer;
pub mod checkin;
pub mod events;
pub mod orders;
pub mod payments;

use ducktickets_auth_types::identity::StaffIdentity;
use ducktickets_domain::staff::StaffRole;

use crate::error::TicketsServiceError;

/// 403 unless the caller holds at least `min`.
pub(crate) fn require_role(
    identity: &StaffIdentity,
    min: StaffRole,
) -> Result<(), TicketsServiceError> {
    if identity.has_role(min) {
        Ok(())
    } else {
        Err(TicketsServiceError::Forbidden)
    }
}
