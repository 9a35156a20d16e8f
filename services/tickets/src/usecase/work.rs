use tracing::info;

use crate::domain::repository::{
    AttendeeRepository, CatalogRepository, Mailer, OrderRepository, OutboxRepository,
    PaymentProvider, PaymentRepository,
};
use crate::domain::types::WorkItem;
use crate::error::TicketsServiceError;
use crate::usecase::payment::ApplyWebhookUseCase;
use crate::usecase::ticket::{IssueTicketsUseCase, SendConfirmationUseCase};
use crate::worker::WorkHandler;

/// Routes outbox work items to their use cases.
pub struct WorkDispatcher<R, A, O, C, M, P, Y>
where
    R: OrderRepository,
    A: AttendeeRepository,
    O: OutboxRepository,
    C: CatalogRepository,
    M: Mailer,
    P: PaymentProvider,
    Y: PaymentRepository,
{
    pub issue_tickets: IssueTicketsUseCase<R, A, O>,
    pub send_confirmation: SendConfirmationUseCase<R, C, M>,
    pub apply_webhook: ApplyWebhookUseCase<P, Y, O>,
}

impl<R, A, O, C, M, P, Y> WorkHandler for WorkDispatcher<R, A, O, C, M, P, Y>
where
    R: OrderRepository,
    A: AttendeeRepository,
    O: OutboxRepository,
    C: CatalogRepository,
    M: Mailer,
    P: PaymentProvider,
    Y: PaymentRepository,
{
    async fn handle(&self, item: WorkItem) -> Result<(), TicketsServiceError> {
        match item {
            WorkItem::IssueTickets { order_id } => {
                self.issue_tickets.execute(order_id).await?;
            }
            WorkItem::SendConfirmation { order_id } => {
                let sent = self.send_confirmation.execute(order_id).await?;
                info!(%order_id, sent, "confirmation emails sent");
            }
            WorkItem::PaymentWebhook { data, event_hash } => {
                let outcome = self.apply_webhook.apply_verified(&data, &event_hash).await?;
                info!(event_hash = %event_hash, outcome = outcome.status(), "deferred webhook applied");
            }
        }
        Ok(())
    }
}
