//! Mock auth helpers for integration tests.
//!
//! Protected routes expect `Authorization: Bearer <jwt>`. `MockAuth` mints a
//! real HS256 token with the secret the test router was built with, so the
//! production extractor runs unchanged.

use std::time::{SystemTime, UNIX_EPOCH};

use http::{HeaderName, HeaderValue, header::AUTHORIZATION};
use uuid::Uuid;

use ducktickets_auth_types::token::issue_access_token;
use ducktickets_domain::staff::StaffRole;

pub const TEST_JWT_SECRET: &str = "ducktickets-test-jwt-secret";

/// Configurable identity injected into test requests.
pub struct MockAuth {
    pub user_id: Uuid,
    pub role: StaffRole,
    pub secret: String,
}

impl MockAuth {
    pub fn new(user_id: Uuid, role: StaffRole) -> Self {
        Self {
            user_id,
            role,
            secret: TEST_JWT_SECRET.to_owned(),
        }
    }

    pub fn staff() -> Self {
        Self::new(Uuid::new_v4(), StaffRole::Staff)
    }

    pub fn admin() -> Self {
        Self::new(Uuid::new_v4(), StaffRole::Admin)
    }

    pub fn customer() -> Self {
        Self::new(Uuid::new_v4(), StaffRole::Customer)
    }

    /// Signed token valid for one hour.
    pub fn token(&self) -> String {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .as_secs()
            + 3600;
        issue_access_token(self.user_id, self.role, exp, &self.secret).expect("mint test token")
    }

    /// `(Authorization, "Bearer <jwt>")` pair for request builders.
    pub fn header(&self) -> (HeaderName, HeaderValue) {
        let value = HeaderValue::from_str(&format!("Bearer {}", self.token()))
            .expect("bearer header is ascii");
        (AUTHORIZATION, value)
    }
}
