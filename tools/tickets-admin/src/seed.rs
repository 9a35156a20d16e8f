use anyhow::Result;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use ducktickets_tickets::domain::repository::CatalogRepository;
use ducktickets_tickets::usecase::catalog::{
    CreateBatchInput, CreateBatchUseCase, CreateEventInput, CreateEventUseCase, EventDetails,
};

/// (name, price in cents, quantity)
const DEMO_BATCHES: [(&str, i64, u32); 3] = [
    ("Early Bird", 9990, 100),
    ("Regular", 14990, 300),
    ("Last Minute", 19990, 100),
];

/// Create "DuckConf 2024" ninety days out, with every batch on sale from now
/// until the event starts.
pub async fn demo_event<C: CatalogRepository + Clone>(catalog: C) -> Result<EventDetails> {
    let now = Utc::now();
    let start_date = now + Duration::days(90);

    let event = CreateEventUseCase {
        catalog: catalog.clone(),
    }
    .execute(CreateEventInput {
        name: "DuckConf 2024".to_owned(),
        description: Some("The annual gathering of the duck-typed community".to_owned()),
        location: Some("Sao Paulo, SP".to_owned()),
        start_date,
        end_date: start_date + Duration::days(2),
        max_attendees: Some(500),
    })
    .await?;

    let create_batch = CreateBatchUseCase { catalog };
    let mut batches = Vec::with_capacity(DEMO_BATCHES.len());
    for (name, cents, quantity) in DEMO_BATCHES {
        let batch = create_batch
            .execute(
                event.id,
                CreateBatchInput {
                    name: name.to_owned(),
                    description: None,
                    price: Decimal::new(cents, 2),
                    quantity,
                    sale_start: now,
                    sale_end: start_date,
                    requires_coupon: false,
                },
            )
            .await?;
        batches.push(batch);
    }
    Ok(EventDetails { event, batches })
}
