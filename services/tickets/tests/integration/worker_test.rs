use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use ducktickets_domain::id::OrderId;
use ducktickets_domain::order::OrderStatus;
use ducktickets_tickets::domain::repository::OutboxRepository;
use ducktickets_tickets::domain::types::{MAX_OUTBOX_ATTEMPTS, OutboxMessage, WorkItem};
use ducktickets_tickets::error::TicketsServiceError;
use ducktickets_tickets::usecase::ticket::{IssueTicketsUseCase, SendConfirmationUseCase};
use ducktickets_tickets::usecase::work::WorkDispatcher;
use ducktickets_tickets::worker::{OutboxWorker, WorkHandler};

use crate::helpers::{
    MemoryStore, MockMailer, MockProvider, create_order_uc, order_input, seed_event,
    signed_webhook, signer, webhook_uc,
};

struct FailingHandler {
    calls: Arc<AtomicUsize>,
}

impl WorkHandler for FailingHandler {
    async fn handle(&self, _item: WorkItem) -> Result<(), TicketsServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow::anyhow!("smtp down").into())
    }
}

fn worker<H: WorkHandler>(store: &MemoryStore, handler: H) -> OutboxWorker<MemoryStore, H> {
    OutboxWorker {
        outbox: store.clone(),
        handler,
        batch_size: 10,
        poll_interval: StdDuration::from_millis(10),
        lease: Duration::minutes(5),
    }
}

/// Make every pending row due again, skipping backoff.
fn make_due(store: &MemoryStore) {
    store.with(|s| {
        for row in s.outbox.iter_mut() {
            row.next_attempt_at = Utc::now() - Duration::seconds(1);
        }
    });
}

#[tokio::test]
async fn should_retry_with_backoff_then_dead_letter() {
    let store = MemoryStore::new();
    store
        .enqueue(
            &OutboxMessage::for_work(&WorkItem::SendConfirmation {
                order_id: OrderId::new(),
            })
            .unwrap(),
        )
        .await
        .unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let worker = worker(
        &store,
        FailingHandler {
            calls: Arc::clone(&calls),
        },
    );

    worker.run_once().await.unwrap();
    let (attempts, next, failed) =
        store.with(|s| (s.outbox[0].attempts, s.outbox[0].next_attempt_at, s.outbox[0].failed));
    assert_eq!(attempts, 1);
    assert!(!failed);
    assert!(next > Utc::now(), "retry must be scheduled in the future");
    assert_eq!(worker.run_once().await.unwrap(), 0, "row is not due yet");

    for _ in 1..MAX_OUTBOX_ATTEMPTS {
        make_due(&store);
        worker.run_once().await.unwrap();
    }

    let row = store.with(|s| s.outbox[0].clone());
    assert_eq!(row.attempts, MAX_OUTBOX_ATTEMPTS);
    assert!(row.failed, "row must be dead-lettered");
    assert_eq!(row.last_error.as_deref(), Some("smtp down"));
    assert_eq!(calls.load(Ordering::SeqCst), MAX_OUTBOX_ATTEMPTS as usize);

    make_due(&store);
    assert_eq!(worker.run_once().await.unwrap(), 0, "dead rows are never claimed");
}

#[tokio::test]
async fn should_dead_letter_undecodable_payload_immediately() {
    let store = MemoryStore::new();
    store
        .enqueue(&OutboxMessage {
            id: Uuid::now_v7(),
            kind: "mystery".to_owned(),
            payload: json!({ "type": "mystery" }),
            idempotency_key: "mystery:1".to_owned(),
        })
        .await
        .unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    worker(
        &store,
        FailingHandler {
            calls: Arc::clone(&calls),
        },
    )
    .run_once()
    .await
    .unwrap();

    assert!(store.with(|s| s.outbox[0].failed));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn should_replay_queued_webhook_once_provider_recovers() {
    let store = MemoryStore::new();
    let provider = MockProvider::new();
    let mailer = MockMailer::default();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, None);
    let order_id = create_order_uc(&store)
        .execute(order_input(event.id, batch.id, 1, "ana@example.com", None))
        .await
        .unwrap()
        .id;
    provider.set_payment("mp-q", order_id, "approved", Decimal::new(9990, 2));
    provider.set_unavailable(true);
    let (body, signature) = signed_webhook("mp-q", "payment.updated");
    webhook_uc(&store, &provider)
        .execute(&body, Some(&signature))
        .await
        .unwrap();

    let worker = worker(
        &store,
        WorkDispatcher {
            issue_tickets: IssueTicketsUseCase {
                orders: store.clone(),
                attendees: store.clone(),
                outbox: store.clone(),
                signer: signer(),
            },
            send_confirmation: SendConfirmationUseCase {
                orders: store.clone(),
                catalog: store.clone(),
                mailer: mailer.clone(),
            },
            apply_webhook: webhook_uc(&store, &provider),
        },
    );

    // Still down: the deferred webhook fails and is rescheduled
    worker.run_once().await.unwrap();
    assert_eq!(store.order(order_id).status, OrderStatus::Pending);
    assert_eq!(store.with(|s| s.outbox[0].attempts), 1);

    provider.set_unavailable(false);
    make_due(&store);
    worker.run_once().await.unwrap(); // payment_webhook
    worker.run_once().await.unwrap(); // issue_tickets
    worker.run_once().await.unwrap(); // send_confirmation

    assert_eq!(store.order(order_id).status, OrderStatus::Paid);
    assert_eq!(store.tokens_of(order_id).len(), 1);
    let sent = mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].ticket_payload, store.tokens_of(order_id)[0]);
    assert!(sent[0].ticket_png.starts_with(b"\x89PNG"));
    assert_eq!(
        store.outbox_kinds(),
        vec!["payment_webhook", "issue_tickets", "send_confirmation"]
    );
}

#[tokio::test]
async fn should_skip_ticket_issue_for_unpaid_order() {
    let store = MemoryStore::new();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 10, None);
    let order_id = create_order_uc(&store)
        .execute(order_input(event.id, batch.id, 1, "ana@example.com", None))
        .await
        .unwrap()
        .id;

    let issued = IssueTicketsUseCase {
        orders: store.clone(),
        attendees: store.clone(),
        outbox: store.clone(),
        signer: signer(),
    }
    .execute(order_id)
    .await
    .unwrap();

    assert_eq!(issued, 0);
    assert!(store.tokens_of(order_id).is_empty());
    assert!(store.outbox_kinds().is_empty());
}
