use proptest::prelude::*;
use rust_decimal::Decimal;

use ducktickets_tickets::error::TicketsServiceError;

use crate::helpers::{MemoryStore, create_order_uc, order_input, seed_event};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn should_never_sell_more_than_batch_quantity(
        capacity in 1u32..20,
        requests in prop::collection::vec(1u32..4, 1..30),
    ) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        let (sold, granted) = runtime.block_on(async {
            let store = MemoryStore::new();
            let (event, batch) = seed_event(&store, Decimal::new(5000, 2), capacity, None);

            let mut handles = Vec::new();
            for (i, quantity) in requests.iter().copied().enumerate() {
                let store = store.clone();
                handles.push(tokio::spawn(async move {
                    let email = format!("buyer{i}@example.com");
                    let result = create_order_uc(&store)
                        .execute(order_input(event.id, batch.id, quantity, &email, None))
                        .await;
                    (quantity, result)
                }));
            }

            let mut granted = 0u32;
            for handle in handles {
                let (quantity, result) = handle.await.unwrap();
                match result {
                    Ok(_) => granted += quantity,
                    Err(TicketsServiceError::InsufficientInventory) => {}
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }
            (store.batch(batch.id).sold_quantity, granted)
        });

        prop_assert!(sold <= capacity, "sold {sold} of {capacity}");
        prop_assert_eq!(sold, granted);
    }
}
