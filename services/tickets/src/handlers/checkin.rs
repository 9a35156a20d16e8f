use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ducktickets_auth_types::identity::StaffIdentity;
use ducktickets_domain::staff::StaffRole;

use super::require_role;
use crate::error::TicketsServiceError;
use crate::state::AppState;
use crate::usecase::checkin::{AdmittedAttendee, CheckInResult, CheckInUseCase};

#[derive(Deserialize)]
pub struct CheckInRequest {
    pub token: String,
}

#[derive(Serialize)]
pub struct CheckedInAttendee {
    pub name: String,
    pub email: String,
    pub event: String,
    pub ticket_type: String,
    #[serde(serialize_with = "ducktickets_core::serde::to_rfc3339_ms")]
    pub checked_in_at: DateTime<Utc>,
}

impl From<AdmittedAttendee> for CheckedInAttendee {
    fn from(a: AdmittedAttendee) -> Self {
        Self {
            name: a.name,
            email: a.email,
            event: a.event,
            ticket_type: a.ticket_type,
            checked_in_at: a.checked_in_at,
        }
    }
}

#[derive(Serialize)]
pub struct CheckInResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_checked_in: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendee: Option<CheckedInAttendee>,
}

impl From<CheckInResult> for CheckInResponse {
    fn from(result: CheckInResult) -> Self {
        match result {
            CheckInResult::Invalid => Self {
                valid: false,
                already_checked_in: None,
                attendee: None,
            },
            CheckInResult::Admitted {
                already_checked_in,
                attendee,
            } => Self {
                valid: true,
                already_checked_in: Some(already_checked_in),
                attendee: Some(attendee.into()),
            },
        }
    }
}

// ── POST /check-in ───────────────────────────────────────────────────────────

pub async fn check_in(
    State(state): State<AppState>,
    identity: StaffIdentity,
    Json(body): Json<CheckInRequest>,
) -> Result<Json<CheckInResponse>, TicketsServiceError> {
    require_role(&identity, StaffRole::Staff)?;
    let usecase = CheckInUseCase {
        attendees: state.attendee_repo(),
        signer: state.signer.clone(),
    };
    let result = usecase.execute(&body.token).await?;
    Ok(Json(result.into()))
}
