use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use ducktickets_domain::order::OrderStatus;
use ducktickets_tickets::error::TicketsServiceError;
use ducktickets_tickets::usecase::idempotency::scope_client_key;
use ducktickets_tickets::usecase::order::{
    CancelOrderUseCase, ExpireOrdersUseCase, GetOrderUseCase,
};

use crate::helpers::{MemoryStore, create_order_uc, order_input, seed_event};

#[tokio::test]
async fn should_replay_order_for_repeated_idempotency_key() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, None);
    let uc = create_order_uc(&store);

    let first = uc
        .execute(order_input(event.id, batch.id, 2, "ana@example.com", Some("key-1")))
        .await
        .unwrap();
    let second = uc
        .execute(order_input(event.id, batch.id, 2, "ana@example.com", Some("key-1")))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(store.order_count(), 1, "replay must not create a second order");
    assert_eq!(store.batch(batch.id).sold_quantity, 2);
}

#[tokio::test]
async fn should_keep_same_header_key_of_different_buyers_apart() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, None);
    let uc = create_order_uc(&store);

    let ana = uc
        .execute(order_input(event.id, batch.id, 1, "ana@example.com", Some("checkout-1")))
        .await
        .unwrap();
    let bia = uc
        .execute(order_input(event.id, batch.id, 3, "bia@example.com", Some("checkout-1")))
        .await
        .unwrap();

    assert_ne!(ana.id, bia.id, "another buyer must never receive the first order");
    assert_eq!(store.order(bia.id).buyer.email, "bia@example.com");
    assert_eq!(store.order_count(), 2);
    assert_eq!(store.batch(batch.id).sold_quantity, 4);
}

#[tokio::test]
async fn should_reject_reused_key_with_different_body() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, None);
    let uc = create_order_uc(&store);

    uc.execute(order_input(event.id, batch.id, 1, "ana@example.com", Some("checkout-1")))
        .await
        .unwrap();
    let more_tickets = uc
        .execute(order_input(event.id, batch.id, 2, "ana@example.com", Some("checkout-1")))
        .await;
    let mut renamed = order_input(event.id, batch.id, 1, "ana@example.com", Some("checkout-1"));
    renamed.full_name = "Ana Lima".to_owned();
    let renamed = uc.execute(renamed).await;

    assert!(
        matches!(more_tickets, Err(TicketsServiceError::IdempotencyKeyReused)),
        "expected IdempotencyKeyReused, got {more_tickets:?}"
    );
    assert!(
        matches!(renamed, Err(TicketsServiceError::IdempotencyKeyReused)),
        "expected IdempotencyKeyReused, got {renamed:?}"
    );
    assert_eq!(store.order_count(), 1);
    assert_eq!(store.batch(batch.id).sold_quantity, 1);
}

#[tokio::test]
async fn should_reject_key_held_by_order_with_different_body_when_cache_is_gone() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, None);
    let uc = create_order_uc(&store);

    uc.execute(order_input(event.id, batch.id, 1, "ana@example.com", Some("checkout-1")))
        .await
        .unwrap();
    store.with(|s| s.idempotency.clear());
    let result = uc
        .execute(order_input(event.id, batch.id, 2, "ana@example.com", Some("checkout-1")))
        .await;

    assert!(
        matches!(result, Err(TicketsServiceError::IdempotencyKeyReused)),
        "expected IdempotencyKeyReused, got {result:?}"
    );
    assert_eq!(store.order_count(), 1);
}

#[tokio::test]
async fn should_derive_key_from_body_when_header_absent() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, None);
    let uc = create_order_uc(&store);

    let first = uc
        .execute(order_input(event.id, batch.id, 1, "Ana@Example.com", None))
        .await
        .unwrap();
    let second = uc
        .execute(order_input(event.id, batch.id, 1, "ana@example.com", None))
        .await
        .unwrap();
    let different = uc
        .execute(order_input(event.id, batch.id, 2, "ana@example.com", None))
        .await
        .unwrap();

    assert_eq!(first.id, second.id, "normalized email must map to the same key");
    assert_ne!(first.id, different.id);
    assert_eq!(store.order_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_persist_one_order_for_concurrent_twins() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 100, None);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            create_order_uc(&store)
                .execute(order_input(event.id, batch.id, 1, "ana@example.com", Some("twin")))
                .await
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }

    ids.dedup();
    assert_eq!(ids.len(), 1, "every twin must see the same order");
    assert_eq!(store.order_count(), 1);
    assert_eq!(store.batch(batch.id).sold_quantity, 1);
}

#[tokio::test]
async fn should_accept_reused_key_after_window_expires() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, None);
    let uc = create_order_uc(&store);

    let first = uc
        .execute(order_input(event.id, batch.id, 1, "ana@example.com", Some("old-key")))
        .await
        .unwrap();
    store.with(|s| {
        s.orders[0].created_at = Utc::now() - Duration::hours(25);
        let key = scope_client_key("ana@example.com", event.id, "old-key");
        s.idempotency.get_mut(&key).unwrap().1 = Utc::now() - Duration::hours(1);
    });

    let second = uc
        .execute(order_input(event.id, batch.id, 1, "ana@example.com", Some("old-key")))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(store.order_count(), 2);
    assert_eq!(store.order(first.id).idempotency_key, None);
}

#[tokio::test]
async fn should_reject_invalid_buyer_before_touching_storage() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, None);

    let result = create_order_uc(&store)
        .execute(order_input(event.id, batch.id, 1, "not-an-email", None))
        .await;

    assert!(
        matches!(result, Err(TicketsServiceError::Validation(_))),
        "expected Validation, got {result:?}"
    );
    assert_eq!(store.order_count(), 0);
    assert!(store.with(|s| s.idempotency.is_empty()));
}

#[tokio::test]
async fn should_enforce_event_capacity_across_batches() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, Some(3));
    let uc = create_order_uc(&store);

    uc.execute(order_input(event.id, batch.id, 2, "a@example.com", None))
        .await
        .unwrap();
    let result = uc
        .execute(order_input(event.id, batch.id, 2, "b@example.com", None))
        .await;

    assert!(
        matches!(result, Err(TicketsServiceError::InsufficientInventory)),
        "expected InsufficientInventory, got {result:?}"
    );
    assert_eq!(store.batch(batch.id).sold_quantity, 2);
}

#[tokio::test]
async fn should_cancel_pending_order_once() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, None);
    let summary = create_order_uc(&store)
        .execute(order_input(event.id, batch.id, 1, "ana@example.com", None))
        .await
        .unwrap();
    let uc = CancelOrderUseCase {
        orders: store.clone(),
    };

    uc.execute(summary.id).await.unwrap();
    let again = uc.execute(summary.id).await;

    assert_eq!(store.order(summary.id).status, OrderStatus::Cancelled);
    assert!(
        matches!(again, Err(TicketsServiceError::InvalidOrderState(_))),
        "expected InvalidOrderState, got {again:?}"
    );
}

#[tokio::test]
async fn should_expire_only_stale_pending_orders() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, None);
    let uc = create_order_uc(&store);
    let stale = uc
        .execute(order_input(event.id, batch.id, 1, "old@example.com", None))
        .await
        .unwrap();
    let fresh = uc
        .execute(order_input(event.id, batch.id, 1, "new@example.com", None))
        .await
        .unwrap();
    store.with(|s| {
        let order = s.orders.iter_mut().find(|o| o.id == stale.id).unwrap();
        order.created_at = Utc::now() - Duration::hours(2);
    });

    let expired = ExpireOrdersUseCase {
        orders: store.clone(),
    }
    .execute(Duration::minutes(30))
    .await
    .unwrap();

    assert_eq!(expired, 1);
    assert_eq!(store.order(stale.id).status, OrderStatus::Expired);
    assert_eq!(store.order(fresh.id).status, OrderStatus::Pending);
}

#[tokio::test]
async fn should_load_order_aggregate_with_attendee_placeholders() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, None);
    let summary = create_order_uc(&store)
        .execute(order_input(event.id, batch.id, 3, "ana@example.com", None))
        .await
        .unwrap();

    let aggregate = GetOrderUseCase {
        orders: store.clone(),
    }
    .execute(summary.id)
    .await
    .unwrap();

    assert_eq!(aggregate.items.len(), 1);
    assert_eq!(aggregate.attendees.len(), 3);
    assert!(aggregate.attendees.iter().all(|a| a.token.is_none()));
    assert_eq!(aggregate.order.total_amount, Decimal::new(29970, 2));
}
