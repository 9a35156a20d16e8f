//! Bearer-token identity extractor.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use http::StatusCode;
use http::header::AUTHORIZATION;
use http::request::Parts;
use uuid::Uuid;

use ducktickets_domain::staff::StaffRole;

use crate::token::validate_access_token;

/// HMAC secret used to validate access tokens. Exposed to the extractor via
/// `FromRef` on the service state.
#[derive(Clone)]
pub struct JwtSecret(pub Arc<str>);

impl JwtSecret {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self(secret.into())
    }
}

/// Authenticated caller, taken from `Authorization: Bearer <jwt>`.
///
/// Returns 401 if the header is absent, not a bearer token, or fails validation.
/// Role enforcement (403) is done by handlers after extraction.
#[derive(Debug, Clone)]
pub struct StaffIdentity {
    pub user_id: Uuid,
    pub role: StaffRole,
}

impl StaffIdentity {
    pub fn has_role(&self, min: StaffRole) -> bool {
        self.role >= min
    }
}

impl<S> FromRequestParts<S> for StaffIdentity
where
    JwtSecret: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // Header parsing and validation are synchronous; the returned future owns its result.
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let secret = JwtSecret::from_ref(state);
        let result = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)
            .and_then(|token| {
                validate_access_token(token.trim(), &secret.0).map_err(|e| {
                    tracing::debug!(error = %e, "rejected access token");
                    StatusCode::UNAUTHORIZED
                })
            })
            .map(|info| Self {
                user_id: info.user_id,
                role: info.role,
            });

        async move { result }
    }
}
