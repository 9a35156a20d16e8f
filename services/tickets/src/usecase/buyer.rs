//! Buyer self-service lookups by email.

use ducktickets_domain::order::OrderStatus;

use crate::domain::repository::{AttendeeRepository, OrderRepository};
use crate::domain::types::{BuyerTicket, Order};
use crate::error::TicketsServiceError;
use crate::usecase::validation::normalize_email;

pub struct ListBuyerOrdersUseCase<R: OrderRepository> {
    pub orders: R,
}

impl<R: OrderRepository> ListBuyerOrdersUseCase<R> {
    pub async fn execute(&self, email: &str) -> Result<Vec<Order>, TicketsServiceError> {
        let email = normalize_email(email)?;
        self.orders.list_by_email(&email).await
    }
}

pub struct ListBuyerTicketsUseCase<A: AttendeeRepository> {
    pub attendees: A,
}

impl<A: AttendeeRepository> ListBuyerTicketsUseCase<A> {
    /// Tickets of paid orders only. Tokens are never returned here; they
    /// travel by email.
    pub async fn execute(&self, email: &str) -> Result<Vec<BuyerTicket>, TicketsServiceError> {
        let email = normalize_email(email)?;
        let mut tickets = self.attendees.list_tickets_by_email(&email).await?;
        tickets.retain(|t| t.order_status == OrderStatus::Paid);
        Ok(tickets)
    }
}
