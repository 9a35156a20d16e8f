use anyhow::Context as _;
use std::io::Cursor;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use ducktickets_domain::id::{AttendeeId, OrderId};
use ducktickets_domain::order::OrderStatus;

use crate::domain::repository::{
    AttendeeRepository, CatalogRepository, Mailer, OrderRepository, OutboxRepository,
};
use crate::domain::types::{ConfirmationEmail, OutboxMessage, WorkItem};
use crate::error::TicketsServiceError;

type HmacSha256 = Hmac<Sha256>;

/// Hex characters of the HMAC kept in a token (64 bits).
pub const SIGNATURE_HEX_LEN: usize = 16;

/// Issues and verifies attendee tokens of the form
/// `"{order_id}:{attendee_id}:{sig}"`, where `sig` is the first
/// [`SIGNATURE_HEX_LEN`] hex characters of HMAC-SHA256 over
/// `"{order_id}:{attendee_id}"`.
#[derive(Clone)]
pub struct TicketSigner {
    key: Arc<[u8]>,
}

impl TicketSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            key: Arc::from(secret.as_bytes()),
        }
    }

    fn signature(&self, data: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(data.as_bytes());
        let mut sig = hex::encode(mac.finalize().into_bytes());
        sig.truncate(SIGNATURE_HEX_LEN);
        sig
    }

    /// Deterministic: the same attendee always gets the same token.
    pub fn sign(&self, order_id: OrderId, attendee_id: AttendeeId) -> String {
        let data = format!("{order_id}:{attendee_id}");
        let sig = self.signature(&data);
        format!("{data}:{sig}")
    }

    /// Ids carried by `token` if its signature is valid.
    pub fn verify(&self, token: &str) -> Option<(OrderId, AttendeeId)> {
        let mut parts = token.split(':');
        let (order, attendee, sig) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || sig.len() != SIGNATURE_HEX_LEN {
            return None;
        }
        let order_id: OrderId = order.parse().ok()?;
        let attendee_id: AttendeeId = attendee.parse().ok()?;
        let expected = self.signature(&format!("{order}:{attendee}"));
        if expected.as_bytes().ct_eq(sig.as_bytes()).into() {
            Some((order_id, attendee_id))
        } else {
            None
        }
    }
}

// ── IssueTickets ─────────────────────────────────────────────────────────────

pub struct IssueTicketsUseCase<R, A, O>
where
    R: OrderRepository,
    A: AttendeeRepository,
    O: OutboxRepository,
{
    pub orders: R,
    pub attendees: A,
    pub outbox: O,
    pub signer: TicketSigner,
}

impl<R, A, O> IssueTicketsUseCase<R, A, O>
where
    R: OrderRepository,
    A: AttendeeRepository,
    O: OutboxRepository,
{
    /// Assign tokens to a paid order's attendees and queue the confirmation.
    /// Safe to repeat. Returns how many tokens were newly assigned.
    pub async fn execute(&self, order_id: OrderId) -> Result<u64, TicketsServiceError> {
        let aggregate = self
            .orders
            .find_aggregate(order_id)
            .await?
            .ok_or(TicketsServiceError::OrderNotFound)?;
        if aggregate.order.status != OrderStatus::Paid {
            debug!(%order_id, status = %aggregate.order.status, "skip ticket issue for unpaid order");
            return Ok(0);
        }

        let tokens: Vec<(AttendeeId, String)> = aggregate
            .attendees
            .iter()
            .filter(|a| a.token.is_none())
            .map(|a| (a.id, self.signer.sign(order_id, a.id)))
            .collect();
        let issued = if tokens.is_empty() {
            0
        } else {
            self.attendees.assign_tokens(&tokens).await?
        };

        let message = OutboxMessage::for_work(&WorkItem::SendConfirmation { order_id })
            .context("encode confirmation work item")?;
        self.outbox.enqueue(&message).await?;
        info!(%order_id, issued, "tickets issued");
        Ok(issued)
    }
}

/// Render a ticket token as a PNG QR code: low error correction, 10px
/// modules, 4-module quiet zone.
pub fn render_qr_png(payload: &str) -> anyhow::Result<Vec<u8>> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)
        .context("encode ticket QR code")?;
    let image = code
        .render::<Luma<u8>>()
        .module_dimensions(10, 10)
        .quiet_zone(true)
        .build();
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("write ticket QR png")?;
    Ok(png)
}

// ── SendConfirmation ─────────────────────────────────────────────────────────

pub struct SendConfirmationUseCase<R, C, M>
where
    R: OrderRepository,
    C: CatalogRepository,
    M: Mailer,
{
    pub orders: R,
    pub catalog: C,
    pub mailer: M,
}

impl<R, C, M> SendConfirmationUseCase<R, C, M>
where
    R: OrderRepository,
    C: CatalogRepository,
    M: Mailer,
{
    /// Mail every attendee of a paid order their ticket. Returns the number sent.
    pub async fn execute(&self, order_id: OrderId) -> Result<usize, TicketsServiceError> {
        let aggregate = self
            .orders
            .find_aggregate(order_id)
            .await?
            .ok_or(TicketsServiceError::OrderNotFound)?;
        if aggregate.order.status != OrderStatus::Paid {
            warn!(%order_id, status = %aggregate.order.status, "confirmation for unpaid order dropped");
            return Ok(0);
        }
        let event = self
            .catalog
            .find_event(aggregate.order.event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;

        let mut sent = 0;
        for attendee in &aggregate.attendees {
            let Some(token) = attendee.token.clone() else {
                return Err(anyhow::anyhow!("attendee {} has no ticket token", attendee.id).into());
            };
            let ticket_png = render_qr_png(&token)?;
            self.mailer
                .send_confirmation(&ConfirmationEmail {
                    to: attendee.email.clone(),
                    attendee_name: attendee.full_name.clone(),
                    event_name: event.name.clone(),
                    ticket_payload: token,
                    ticket_png,
                    order_id,
                })
                .await?;
            sent += 1;
        }
        Ok(sent)
    }
}
