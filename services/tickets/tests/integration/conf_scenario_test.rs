use std::time::Duration as StdDuration;

use chrono::Duration;
use rust_decimal::Decimal;

use ducktickets_domain::order::OrderStatus;
use ducktickets_tickets::error::TicketsServiceError;
use ducktickets_tickets::usecase::checkin::{CheckInResult, CheckInUseCase};
use ducktickets_tickets::usecase::payment::WebhookOutcome;
use ducktickets_tickets::usecase::ticket::{IssueTicketsUseCase, SendConfirmationUseCase};
use ducktickets_tickets::usecase::work::WorkDispatcher;
use ducktickets_tickets::worker::OutboxWorker;

use crate::helpers::{
    MemoryStore, MockMailer, MockProvider, create_order_uc, order_input, seed_event, signed_webhook,
    signer, webhook_uc,
};

#[tokio::test]
async fn should_sell_pay_issue_and_admit_conf_tickets() {
    let store = MemoryStore::new();
    let provider = MockProvider::new();
    let mailer = MockMailer::default();
    let (event, batch) = seed_event(&store, Decimal::new(9990, 2), 2, None);

    // Two tickets at 99.90
    let order = create_order_uc(&store)
        .execute(order_input(event.id, batch.id, 2, "ana@example.com", None))
        .await
        .unwrap();
    assert_eq!(order.total_amount, Decimal::new(19980, 2));
    assert_eq!(order.status, OrderStatus::Pending);

    // A third ticket does not fit
    let third = create_order_uc(&store)
        .execute(order_input(event.id, batch.id, 1, "bia@example.com", None))
        .await;
    assert!(
        matches!(third, Err(TicketsServiceError::InsufficientInventory)),
        "expected InsufficientInventory, got {third:?}"
    );

    // Approval webhook pays the order
    provider.set_payment("mp-conf", order.id, "approved", order.total_amount);
    let (body, signature) = signed_webhook("mp-conf", "payment.updated");
    let outcome = webhook_uc(&store, &provider)
        .execute(&body, Some(&signature))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        WebhookOutcome::Applied {
            order_id: order.id,
            order_paid: true
        }
    );

    // Worker issues tickets, then mails them
    let worker = OutboxWorker {
        outbox: store.clone(),
        handler: WorkDispatcher {
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
        batch_size: 10,
        poll_interval: StdDuration::from_millis(10),
        lease: Duration::minutes(5),
    };
    assert_eq!(worker.run_once().await.unwrap(), 1);
    assert_eq!(worker.run_once().await.unwrap(), 1);
    assert_eq!(worker.run_once().await.unwrap(), 0);

    let tokens = store.tokens_of(order.id);
    assert_eq!(tokens.len(), 2);
    assert_ne!(tokens[0], tokens[1], "each attendee gets a distinct token");
    {
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.event_name == "DuckConf"));
    }

    // Door scans: forged, first, repeat
    let check_in = CheckInUseCase {
        attendees: store.clone(),
        signer: signer(),
    };
    let mut forged = tokens[0].clone();
    let last = forged.pop().unwrap();
    forged.push(if last == '0' { '1' } else { '0' });

    let scans = [
        check_in.execute(&forged).await.unwrap(),
        check_in.execute(&tokens[0]).await.unwrap(),
        check_in.execute(&tokens[0]).await.unwrap(),
    ];
    let pattern: Vec<Option<bool>> = scans
        .iter()
        .map(|r| match r {
            CheckInResult::Invalid => None,
            CheckInResult::Admitted {
                already_checked_in, ..
            } => Some(*already_checked_in),
        })
        .collect();
    assert_eq!(pattern, vec![None, Some(false), Some(true)]);

    let second_ticket = check_in.execute(&tokens[1]).await.unwrap();
    assert!(matches!(
        second_ticket,
        CheckInResult::Admitted {
            already_checked_in: false,
            ..
        }
    ));
}
