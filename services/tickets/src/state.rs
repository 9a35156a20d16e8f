use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use ducktickets_auth_types::identity::JwtSecret;

use crate::config::TicketsConfig;
use crate::domain::repository::PaymentProvider;
use crate::infra::db::{
    DbAttendeeRepository, DbCatalogRepository, DbIdempotencyStore, DbOrderRepository,
    DbOutboxRepository, DbPaymentRepository,
};
use crate::infra::mailer::LogMailer;
use crate::infra::mercado_pago::MercadoPagoProvider;
use crate::usecase::payment::ApplyWebhookUseCase;
use crate::usecase::ticket::{IssueTicketsUseCase, SendConfirmationUseCase, TicketSigner};
use crate::usecase::work::WorkDispatcher;
use crate::worker::OutboxWorker;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub jwt_secret: JwtSecret,
    pub signer: TicketSigner,
    pub provider: MercadoPagoProvider,
    pub idempotency_ttl: chrono::Duration,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &TicketsConfig) -> Self {
        Self {
            db,
            jwt_secret: JwtSecret::new(config.jwt_secret.as_str()),
            signer: TicketSigner::new(&config.ticket_signing_secret),
            provider: MercadoPagoProvider::new(
                &config.mercado_pago_access_token,
                &config.mercado_pago_webhook_secret,
                &config.mercado_pago_api_url,
                &config.public_base_url,
            ),
            idempotency_ttl: chrono::Duration::hours(config.idempotency_ttl_hours),
        }
    }

    pub fn catalog_repo(&self) -> DbCatalogRepository {
        DbCatalogRepository {
            db: self.db.clone(),
        }
    }

    pub fn order_repo(&self) -> DbOrderRepository {
        DbOrderRepository {
            db: self.db.clone(),
        }
    }

    pub fn idempotency_store(&self) -> DbIdempotencyStore {
        DbIdempotencyStore {
            db: self.db.clone(),
        }
    }

    pub fn payment_repo(&self) -> DbPaymentRepository {
        DbPaymentRepository {
            db: self.db.clone(),
            provider: self.provider.name(),
        }
    }

    pub fn attendee_repo(&self) -> DbAttendeeRepository {
        DbAttendeeRepository {
            db: self.db.clone(),
        }
    }

    pub fn outbox_repo(&self) -> DbOutboxRepository {
        DbOutboxRepository {
            db: self.db.clone(),
        }
    }

    pub fn apply_webhook(
        &self,
    ) -> ApplyWebhookUseCase<MercadoPagoProvider, DbPaymentRepository, DbOutboxRepository> {
        ApplyWebhookUseCase {
            provider: self.provider.clone(),
            payments: self.payment_repo(),
            outbox: self.outbox_repo(),
        }
    }

    /// Outbox worker wired to the database-backed use cases.
    pub fn outbox_worker(
        &self,
        config: &TicketsConfig,
    ) -> OutboxWorker<
        DbOutboxRepository,
        WorkDispatcher<
            DbOrderRepository,
            DbAttendeeRepository,
            DbOutboxRepository,
            DbCatalogRepository,
            LogMailer,
            MercadoPagoProvider,
            DbPaymentRepository,
        >,
    > {
        OutboxWorker {
            outbox: self.outbox_repo(),
            handler: WorkDispatcher {
                issue_tickets: IssueTicketsUseCase {
                    orders: self.order_repo(),
                    attendees: self.attendee_repo(),
                    outbox: self.outbox_repo(),
                    signer: self.signer.clone(),
                },
                send_confirmation: SendConfirmationUseCase {
                    orders: self.order_repo(),
                    catalog: self.catalog_repo(),
                    mailer: LogMailer,
                },
                apply_webhook: self.apply_webhook(),
            },
            batch_size: config.outbox_batch_size,
            poll_interval: std::time::Duration::from_millis(config.outbox_poll_interval_ms),
            lease: chrono::Duration::minutes(5),
        }
    }
}

impl FromRef<AppState> for JwtSecret {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_secret.clone()
    }
}

impl AsRef<DatabaseConnection> for AppState {
    fn as_ref(&self) -> &DatabaseConnection {
        &self.db
    }
}
