use rust_decimal::Decimal;

use ducktickets_domain::id::OrderId;
use ducktickets_domain::order::OrderStatus;
use ducktickets_domain::payment::PaymentStatus;
use ducktickets_tickets::error::TicketsServiceError;
use ducktickets_tickets::usecase::payment::{StartCheckoutUseCase, WebhookOutcome};

use crate::helpers::{
    MemoryStore, MockProvider, create_order_uc, order_input, seed_event, signed_webhook,
    webhook_uc,
};

async fn pending_order(store: &MemoryStore) -> OrderId {
    let (event, batch) = seed_event(store, Decimal::new(9990, 2), 10, None);
    create_order_uc(store)
        .execute(order_input(event.id, batch.id, 2, "ana@example.com", None))
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn should_apply_approval_once_and_report_replay_as_duplicate() {
    let store = MemoryStore::new();
    let provider = MockProvider::new();
    let order_id = pending_order(&store).await;
    provider.set_payment("mp-1", order_id, "approved", Decimal::new(19980, 2));
    let uc = webhook_uc(&store, &provider);
    let (body, signature) = signed_webhook("mp-1", "payment.updated");

    let first = uc.execute(&body, Some(&signature)).await.unwrap();
    let replay = uc.execute(&body, Some(&signature)).await.unwrap();

    assert_eq!(
        first,
        WebhookOutcome::Applied {
            order_id,
            order_paid: true
        }
    );
    assert_eq!(replay, WebhookOutcome::Duplicate);
    assert_eq!(store.order(order_id).status, OrderStatus::Paid);
    assert_eq!(store.outbox_kinds(), vec!["issue_tickets".to_owned()]);
}

#[tokio::test]
async fn should_refuse_to_overwrite_terminal_payment() {
    let store = MemoryStore::new();
    let provider = MockProvider::new();
    let order_id = pending_order(&store).await;
    let uc = webhook_uc(&store, &provider);

    provider.set_payment("mp-2", order_id, "approved", Decimal::new(19980, 2));
    let (body, signature) = signed_webhook("mp-2", "payment.created");
    uc.execute(&body, Some(&signature)).await.unwrap();

    // Provider later reports pending for the same payment; a regression is refused.
    provider.set_payment("mp-2", order_id, "pending", Decimal::new(19980, 2));
    let (body, signature) = signed_webhook("mp-2", "payment.updated");
    let outcome = uc.execute(&body, Some(&signature)).await.unwrap();

    assert_eq!(outcome, WebhookOutcome::Duplicate);
    let stored = store.with(|s| s.payments["mp-2"].status);
    assert_eq!(stored, PaymentStatus::Approved);
}

#[tokio::test]
async fn should_move_pending_payment_to_approved() {
    let store = MemoryStore::new();
    let provider = MockProvider::new();
    let order_id = pending_order(&store).await;
    let uc = webhook_uc(&store, &provider);

    provider.set_payment("mp-3", order_id, "in_process", Decimal::new(19980, 2));
    let (body, signature) = signed_webhook("mp-3", "payment.created");
    let pending = uc.execute(&body, Some(&signature)).await.unwrap();
    assert_eq!(
        pending,
        WebhookOutcome::Applied {
            order_id,
            order_paid: false
        }
    );
    assert_eq!(store.order(order_id).status, OrderStatus::Pending);

    provider.set_payment("mp-3", order_id, "approved", Decimal::new(19980, 2));
    let (body, signature) = signed_webhook("mp-3", "payment.updated");
    let approved = uc.execute(&body, Some(&signature)).await.unwrap();
    assert_eq!(
        approved,
        WebhookOutcome::Applied {
            order_id,
            order_paid: true
        }
    );
}

#[tokio::test]
async fn should_leave_order_pending_on_rejection() {
    let store = MemoryStore::new();
    let provider = MockProvider::new();
    let order_id = pending_order(&store).await;
    provider.set_payment("mp-4", order_id, "rejected", Decimal::new(19980, 2));
    let (body, signature) = signed_webhook("mp-4", "payment.updated");

    let outcome = webhook_uc(&store, &provider)
        .execute(&body, Some(&signature))
        .await
        .unwrap();

    assert!(matches!(outcome, WebhookOutcome::Applied { order_paid: false, .. }));
    assert_eq!(store.order(order_id).status, OrderStatus::Pending);
    assert!(store.outbox_kinds().is_empty());
}

#[tokio::test]
async fn should_reject_bad_or_missing_signature_without_state_change() {
    let store = MemoryStore::new();
    let provider = MockProvider::new();
    let order_id = pending_order(&store).await;
    provider.set_payment("mp-5", order_id, "approved", Decimal::new(19980, 2));
    let uc = webhook_uc(&store, &provider);
    let (body, _) = signed_webhook("mp-5", "payment.updated");

    let forged = uc.execute(&body, Some("00ff")).await;
    let missing = uc.execute(&body, None).await;

    assert!(
        matches!(forged, Err(TicketsServiceError::InvalidSignature)),
        "expected InvalidSignature, got {forged:?}"
    );
    assert!(matches!(missing, Err(TicketsServiceError::InvalidSignature)));
    assert_eq!(store.order(order_id).status, OrderStatus::Pending);
    assert!(store.with(|s| s.payments.is_empty()));
}

#[tokio::test]
async fn should_ignore_non_payment_notifications() {
    let store = MemoryStore::new();
    let provider = MockProvider::new();
    let body = br#"{"type":"merchant_order","data":{"id":"77"}}"#;
    let signature = ducktickets_tickets::infra::mercado_pago::sign_body(
        crate::helpers::WEBHOOK_SECRET,
        body,
    );

    let outcome = webhook_uc(&store, &provider)
        .execute(body, Some(&signature))
        .await
        .unwrap();

    assert_eq!(outcome, WebhookOutcome::Ignored);
}

#[tokio::test]
async fn should_report_payment_for_unknown_order() {
    let store = MemoryStore::new();
    let provider = MockProvider::new();
    provider.set_payment("mp-6", OrderId::new(), "approved", Decimal::new(100, 0));
    let (body, signature) = signed_webhook("mp-6", "payment.updated");

    let outcome = webhook_uc(&store, &provider)
        .execute(&body, Some(&signature))
        .await
        .unwrap();

    assert_eq!(outcome, WebhookOutcome::OrderNotFound);
}

#[tokio::test]
async fn should_queue_webhook_when_provider_is_unavailable() {
    let store = MemoryStore::new();
    let provider = MockProvider::new();
    let order_id = pending_order(&store).await;
    provider.set_payment("mp-7", order_id, "approved", Decimal::new(19980, 2));
    provider.set_unavailable(true);
    let (body, signature) = signed_webhook("mp-7", "payment.updated");

    let outcome = webhook_uc(&store, &provider)
        .execute(&body, Some(&signature))
        .await
        .unwrap();

    assert_eq!(outcome, WebhookOutcome::Queued);
    assert_eq!(store.outbox_kinds(), vec!["payment_webhook".to_owned()]);
    assert_eq!(store.order(order_id).status, OrderStatus::Pending);
}

#[tokio::test]
async fn should_start_checkout_for_pending_order_only() {
    let store = MemoryStore::new();
    let provider = MockProvider::new();
    let order_id = pending_order(&store).await;
    let uc = StartCheckoutUseCase {
        orders: store.clone(),
        catalog: store.clone(),
        provider: provider.clone(),
    };

    let session = uc.execute(order_id).await.unwrap();
    assert_eq!(session.preference_id, format!("pref-{order_id}"));
    {
        let checkouts = provider.checkouts.lock().unwrap();
        assert_eq!(checkouts[0].lines[0].title, "Early Bird - DuckConf");
        assert_eq!(checkouts[0].lines[0].quantity, 2);
    }

    store.with(|s| s.orders[0].status = OrderStatus::Paid);
    let paid = uc.execute(order_id).await;
    assert!(
        matches!(paid, Err(TicketsServiceError::InvalidOrderState(_))),
        "expected InvalidOrderState, got {paid:?}"
    );
}
