use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::trace::TraceLayer;

use ducktickets_core::health::{healthz, readyz};
use ducktickets_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    admin::{export_attendees, get_status, list_attendees, list_event_orders},
    buyer::{list_buyer_orders, list_buyer_tickets},
    checkin::check_in,
    events::{
        create_batch, create_coupon, create_event, delete_batch, delete_event, get_event,
        list_events, update_batch,
    },
    orders::{cancel_order, create_order, get_order, start_checkout},
    payments::payment_webhook,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz::<AppState>))
        // Catalog
        .route("/events", get(list_events).post(create_event))
        .route("/events/{event_id}", get(get_event).delete(delete_event))
        .route("/events/{event_id}/batches", post(create_batch))
        .route(
            "/events/{event_id}/batches/{batch_id}",
            patch(update_batch).delete(delete_batch),
        )
        .route("/events/{event_id}/coupons", post(create_coupon))
        // Admin reports
        .route("/admin/status", get(get_status))
        .route("/events/{event_id}/attendees", get(list_attendees))
        .route("/events/{event_id}/attendees.csv", get(export_attendees))
        .route("/events/{event_id}/orders", get(list_event_orders))
        // Orders
        .route("/orders", post(create_order))
        .route("/orders/{order_id}", get(get_order))
        .route("/orders/{order_id}/cancel", post(cancel_order))
        .route("/orders/{order_id}/payment", post(start_checkout))
        // Buyer lookup
        .route("/buyer/orders", get(list_buyer_orders))
        .route("/buyer/tickets", get(list_buyer_tickets))
        // Payments
        .route("/webhooks/payments", post(payment_webhook))
        // Check-in
        .route("/check-in", post(check_in))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id_layer())
        .layer(request_id_layer())
        .with_state(state)
}
