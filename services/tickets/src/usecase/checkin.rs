use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use ducktickets_domain::order::OrderStatus;

use crate::domain::repository::AttendeeRepository;
use crate::domain::types::CheckInTarget;
use crate::error::TicketsServiceError;
use crate::usecase::ticket::TicketSigner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedAttendee {
    pub name: String,
    pub email: String,
    pub event: String,
    pub ticket_type: String,
    pub checked_in_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInResult {
    /// Forged, malformed, or unknown token.
    Invalid,
    Admitted {
        already_checked_in: bool,
        attendee: AdmittedAttendee,
    },
}

fn admitted(
    target: CheckInTarget,
    checked_in_at: DateTime<Utc>,
    already_checked_in: bool,
) -> CheckInResult {
    CheckInResult::Admitted {
        already_checked_in,
        attendee: AdmittedAttendee {
            name: target.attendee.full_name,
            email: target.attendee.email,
            event: target.event_name,
            ticket_type: target.batch_name,
            checked_in_at,
        },
    }
}

pub struct CheckInUseCase<A: AttendeeRepository> {
    pub attendees: A,
    pub signer: TicketSigner,
}

impl<A: AttendeeRepository> CheckInUseCase<A> {
    pub async fn execute(&self, token: &str) -> Result<CheckInResult, TicketsServiceError> {
        // Signature first; no storage access for forged tokens
        let Some((order_id, attendee_id)) = self.signer.verify(token.trim()) else {
            debug!("check-in token failed verification");
            return Ok(CheckInResult::Invalid);
        };

        let Some(target) = self.attendees.find_check_in_target(attendee_id).await? else {
            return Ok(CheckInResult::Invalid);
        };
        let stored_matches = target
            .attendee
            .token
            .as_deref()
            .is_some_and(|stored| bool::from(stored.as_bytes().ct_eq(token.trim().as_bytes())));
        if target.attendee.order_id != order_id || !stored_matches {
            return Ok(CheckInResult::Invalid);
        }
        if target.order_status != OrderStatus::Paid {
            return Err(TicketsServiceError::TicketNotPaid);
        }

        if target.attendee.checked_in {
            let at = target.attendee.checked_in_at.unwrap_or_else(Utc::now);
            return Ok(admitted(target, at, true));
        }

        let now = Utc::now();
        if self.attendees.mark_checked_in(attendee_id, now).await? {
            info!(%order_id, %attendee_id, "attendee checked in");
            return Ok(admitted(target, now, false));
        }

        // A concurrent scan won; report its timestamp.
        let winner = self
            .attendees
            .find_check_in_target(attendee_id)
            .await?
            .ok_or(TicketsServiceError::OrderNotFound)?;
        let at = winner.attendee.checked_in_at.unwrap_or(now);
        Ok(admitted(winner, at, true))
    }
}
