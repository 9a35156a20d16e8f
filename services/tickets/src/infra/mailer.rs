use tracing::info;

use crate::domain::repository::Mailer;
use crate::domain::types::ConfirmationEmail;
use crate::error::TicketsServiceError;

/// Mailer that records confirmations in the log instead of sending them.
#[derive(Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send_confirmation(&self, email: &ConfirmationEmail) -> Result<(), TicketsServiceError> {
        info!(
            order_id = %email.order_id,
            to = %email.to,
            event = %email.event_name,
            qr_png_bytes = email.ticket_png.len(),
            "ticket confirmation"
        );
        Ok(())
    }
}
