use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use ducktickets_core::error::{error_response, log_internal};
use ducktickets_domain::order::InvalidTransition;

/// Tickets service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum TicketsServiceError {
    #[error("event not found")]
    EventNotFound,
    #[error("ticket batch not found")]
    BatchNotFound,
    #[error("order not found")]
    OrderNotFound,
    #[error("sale window closed")]
    SaleWindowClosed,
    #[error("insufficient inventory")]
    InsufficientInventory,
    #[error("coupon required")]
    CouponRequired,
    #[error("invalid coupon")]
    InvalidCoupon,
    #[error("coupon already exists")]
    CouponAlreadyExists,
    #[error("idempotency key was already used for a different request")]
    IdempotencyKeyReused,
    #[error("event has orders")]
    EventHasOrders,
    #[error("ticket batch has orders")]
    BatchHasOrders,
    #[error(transparent)]
    InvalidOrderState(#[from] InvalidTransition),
    #[error("ticket not paid")]
    TicketNotPaid,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("forbidden")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error("payment provider error: {0}")]
    PaymentProvider(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl TicketsServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::BatchNotFound => "BATCH_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::SaleWindowClosed => "SALE_WINDOW_CLOSED",
            Self::InsufficientInventory => "INSUFFICIENT_INVENTORY",
            Self::CouponRequired => "COUPON_REQUIRED",
            Self::InvalidCoupon => "INVALID_COUPON",
            Self::CouponAlreadyExists => "COUPON_ALREADY_EXISTS",
            Self::IdempotencyKeyReused => "IDEMPOTENCY_KEY_REUSED",
            Self::EventHasOrders => "EVENT_HAS_ORDERS",
            Self::BatchHasOrders => "BATCH_HAS_ORDERS",
            Self::InvalidOrderState(_) => "INVALID_ORDER_STATE",
            Self::TicketNotPaid => "TICKET_NOT_PAID",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Forbidden => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PaymentProvider(_) => "PAYMENT_PROVIDER_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl IntoResponse for TicketsServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::EventNotFound | Self::BatchNotFound | Self::OrderNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::SaleWindowClosed
            | Self::InsufficientInventory
            | Self::CouponAlreadyExists
            | Self::IdempotencyKeyReused
            | Self::EventHasOrders
            | Self::BatchHasOrders
            | Self::InvalidOrderState(_)
            | Self::TicketNotPaid => StatusCode::CONFLICT,
            Self::CouponRequired | Self::InvalidCoupon | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::PaymentProvider(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(ref e) = self {
            log_internal(e);
        }
        error_response(status, self.kind(), self.to_string())
    }
}
