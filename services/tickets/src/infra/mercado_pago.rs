//! Mercado Pago checkout client.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::repository::PaymentProvider;
use crate::domain::types::{CheckoutRequest, CheckoutSession, ProviderPayment};
use crate::error::TicketsServiceError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct MercadoPagoProvider {
    http: reqwest::Client,
    access_token: Arc<str>,
    webhook_secret: Arc<str>,
    api_base: Arc<str>,
    public_base_url: Arc<str>,
}

impl MercadoPagoProvider {
    pub fn new(
        access_token: &str,
        webhook_secret: &str,
        api_base: &str,
        public_base_url: &str,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token: access_token.into(),
            webhook_secret: webhook_secret.into(),
            api_base: api_base.trim_end_matches('/').into(),
            public_base_url: public_base_url.trim_end_matches('/').into(),
        }
    }

    fn preference_body(&self, request: &CheckoutRequest) -> Value {
        let base = &self.public_base_url;
        let order_id = request.order_id;
        let items: Vec<Value> = request
            .lines
            .iter()
            .map(|line| {
                json!({
                    "title": line.title,
                    "quantity": line.quantity,
                    "unit_price": line.unit_price.to_f64().unwrap_or_default(),
                    "currency_id": "BRL",
                })
            })
            .collect();
        json!({
            "items": items,
            "payer": {
                "name": request.buyer.full_name,
                "email": request.buyer.email,
                "phone": { "number": request.buyer.phone.as_deref().unwrap_or_default() },
            },
            "external_reference": order_id.to_string(),
            "notification_url": format!("{base}/webhooks/payments"),
            "back_urls": {
                "success": format!("{base}/checkout/success?order_id={order_id}"),
                "failure": format!("{base}/checkout/failure?order_id={order_id}"),
                "pending": format!("{base}/checkout/pending?order_id={order_id}"),
            },
            "auto_return": "approved",
        })
    }
}

fn provider_error(context: &str, e: impl std::fmt::Display) -> TicketsServiceError {
    TicketsServiceError::PaymentProvider(format!("{context}: {e}"))
}

/// Lowercase hex HMAC-SHA256 of `body`.
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Read a `/v1/payments/{id}` response.
fn payment_from_json(raw: Value) -> Option<ProviderPayment> {
    let id = match raw.get("id")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let status = raw.get("status")?.as_str()?.to_owned();
    let external_reference = raw
        .get("external_reference")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let amount = raw
        .get("transaction_amount")
        .and_then(|v| match v {
            Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
            Value::String(s) => s.parse::<Decimal>().ok(),
            _ => None,
        })
        .map(|d| d.round_dp(2));
    let payment_method = raw
        .get("payment_method_id")
        .and_then(Value::as_str)
        .map(str::to_owned);
    Some(ProviderPayment {
        id,
        status,
        external_reference,
        amount,
        payment_method,
        raw,
    })
}

impl PaymentProvider for MercadoPagoProvider {
    fn name(&self) -> &'static str {
        "mercado_pago"
    }

    async fn create_payment(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, TicketsServiceError> {
        let response = self
            .http
            .post(format!("{}/checkout/preferences", self.api_base))
            .bearer_auth(&*self.access_token)
            .json(&self.preference_body(request))
            .send()
            .await
            .map_err(|e| provider_error("create preference", e))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| provider_error("decode preference", e))?;
        if !status.is_success() {
            return Err(provider_error("create preference", format!("{status} {body}")));
        }

        let field = |name: &str| {
            body.get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| provider_error("create preference", format!("missing {name}")))
        };
        Ok(CheckoutSession {
            preference_id: field("id")?,
            checkout_url: field("init_point")?,
        })
    }

    fn verify_webhook(&self, body: &[u8], signature: &str) -> bool {
        if self.webhook_secret.is_empty() {
            return false;
        }
        let expected = sign_body(&self.webhook_secret, body);
        expected
            .as_bytes()
            .ct_eq(signature.trim().to_ascii_lowercase().as_bytes())
            .into()
    }

    async fn get_payment_status(
        &self,
        external_id: &str,
    ) -> Result<Option<ProviderPayment>, TicketsServiceError> {
        let response = self
            .http
            .get(format!("{}/v1/payments/{external_id}", self.api_base))
            .bearer_auth(&*self.access_token)
            .send()
            .await
            .map_err(|e| provider_error("get payment", e))?;
        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => {
                return Err(provider_error("get payment", status));
            }
            _ => {}
        }
        let raw: Value = response
            .json()
            .await
            .map_err(|e| provider_error("decode payment", e))?;
        Ok(payment_from_json(raw))
    }
}
