use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Build the JSON error body every service returns: `{"kind": ..., "message": ...}`.
///
/// Service error enums call this from their `IntoResponse` impl after picking
/// the status and a stable `kind` string.
pub fn error_response(status: StatusCode, kind: &'static str, message: String) -> Response {
    let body = serde_json::json!({
        "kind": kind,
        "message": message,
    });
    (status, axum::Json(body)).into_response()
}

/// Log an internal failure. 4xx are expected client errors and are already
/// recorded by the tower-http `TraceLayer`.
pub fn log_internal(error: &anyhow::Error) {
    ::tracing::error!(error = format!("{error:#}"), kind = "INTERNAL", "internal error");
}
