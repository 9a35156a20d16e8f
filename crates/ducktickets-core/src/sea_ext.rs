use sea_orm::{DbErr, SqlErr};

/// True when `err` is a unique-constraint violation.
///
/// Used where a concurrent insert losing a race is an expected outcome rather
/// than a failure (idempotency keys, payment external ids).
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
