use ducktickets_core::config::{or_default, or_empty, required};

/// Tickets service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct TicketsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port to listen on (default 8000). Env var: `TICKETS_PORT`.
    pub port: u16,
    /// HMAC key for attendee ticket tokens.
    pub ticket_signing_secret: String,
    /// HMAC key for staff access tokens.
    pub jwt_secret: String,
    /// Mercado Pago API bearer token.
    pub mercado_pago_access_token: String,
    /// Shared secret for webhook body signatures.
    pub mercado_pago_webhook_secret: String,
    /// Provider API base (default `https://api.mercadopago.com`).
    pub mercado_pago_api_url: String,
    /// Public origin used for checkout return and notification URLs.
    pub public_base_url: String,
    pub idempotency_ttl_hours: i64,
    pub outbox_poll_interval_ms: u64,
    pub outbox_batch_size: u64,
}

impl TicketsConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            database_url: required("DATABASE_URL")?,
            port: or_default("TICKETS_PORT", 8000)?,
            ticket_signing_secret: required("TICKET_SIGNING_SECRET")?,
            jwt_secret: required("JWT_SECRET")?,
            mercado_pago_access_token: or_empty("MERCADO_PAGO_ACCESS_TOKEN"),
            mercado_pago_webhook_secret: required("MERCADO_PAGO_WEBHOOK_SECRET")?,
            mercado_pago_api_url: or_default(
                "MERCADO_PAGO_API_URL",
                "https://api.mercadopago.com".to_owned(),
            )?,
            public_base_url: or_default("PUBLIC_BASE_URL", "http://localhost:8000".to_owned())?,
            idempotency_ttl_hours: or_default("IDEMPOTENCY_TTL_HOURS", 24)?,
            outbox_poll_interval_ms: or_default("OUTBOX_POLL_INTERVAL_MS", 1000)?,
            outbox_batch_size: or_default("OUTBOX_BATCH_SIZE", 10)?,
        };
        anyhow::ensure!(
            !config.ticket_signing_secret.is_empty(),
            "TICKET_SIGNING_SECRET must not be empty"
        );
        anyhow::ensure!(
            !config.mercado_pago_webhook_secret.is_empty(),
            "MERCADO_PAGO_WEBHOOK_SECRET must not be empty"
        );
        Ok(config)
    }
}
