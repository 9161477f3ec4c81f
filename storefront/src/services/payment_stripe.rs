// storefront/src/services/payment_stripe.rs

//! Stripe Checkout over the REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::services::payment::{CheckoutSessionRequest, PaymentGateway, PaymentSession, PaymentSessionStatus};

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
  id: String,
  #[serde(default)]
  payment_status: Option<String>,
  #[serde(default)]
  amount_total: Option<i64>,
  #[serde(default)]
  currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
  error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
  #[serde(default)]
  message: Option<String>,
}

pub struct StripeGateway {
  client: reqwest::Client,
  api_base: String,
  secret_key: String,
  publishable_key: String,
}

impl StripeGateway {
  pub fn from_config(config: &AppConfig) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.payment_timeout_secs))
      .build()
      .map_err(|e| AppError::Config(format!("Failed to build payment HTTP client: {}", e)))?;
    Ok(Self {
      client,
      api_base: config.stripe_api_base.clone(),
      secret_key: config.stripe_secret_key.clone(),
      publishable_key: config.stripe_publishable_key.clone(),
    })
  }

  fn sessions_url(&self) -> String {
    format!("{}/v1/checkout/sessions", self.api_base)
  }

  async fn decode(response: reqwest::Response) -> Result<StripeCheckoutSession> {
    let status = response.status();
    if status.is_success() {
      return response
        .json::<StripeCheckoutSession>()
        .await
        .map_err(|e| AppError::Payment(format!("Unreadable payment provider response: {}", e)));
    }
    let message = response
      .json::<StripeErrorBody>()
      .await
      .ok()
      .and_then(|body| body.error.message)
      .unwrap_or_else(|| format!("payment provider returned HTTP {}", status.as_u16()));
    tracing::warn!(status = status.as_u16(), %message, "Payment provider rejected request");
    Err(AppError::Payment(message))
  }
}

/// Form fields for a one-line, card-only checkout session in payment mode.
pub fn checkout_session_form(request: &CheckoutSessionRequest) -> Vec<(&'static str, String)> {
  vec![
    ("mode", "payment".to_string()),
    ("payment_method_types[0]", "card".to_string()),
    ("line_items[0][quantity]", "1".to_string()),
    ("line_items[0][price_data][currency]", request.currency.clone()),
    ("line_items[0][price_data][unit_amount]", request.amount_minor.to_string()),
    ("line_items[0][price_data][product_data][name]", request.product_name.clone()),
    ("success_url", request.success_url.clone()),
    ("cancel_url", request.cancel_url.clone()),
    ("client_reference_id", request.client_reference_id.clone()),
  ]
}

#[async_trait]
impl PaymentGateway for StripeGateway {
  fn publishable_key(&self) -> &str {
    &self.publishable_key
  }

  #[instrument(name = "stripe::create_checkout_session", skip(self, request), fields(amount = request.amount_minor, currency = %request.currency))]
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<PaymentSession> {
    let response = self
      .client
      .post(self.sessions_url())
      .basic_auth(&self.secret_key, None::<&str>)
      .form(&checkout_session_form(request))
      .send()
      .await?;
    let session = Self::decode(response).await?;
    tracing::info!(session_id = %session.id, "Created hosted checkout session");
    Ok(PaymentSession { id: session.id })
  }

  #[instrument(name = "stripe::retrieve_session", skip(self))]
  async fn retrieve_session(&self, session_id: &str) -> Result<PaymentSessionStatus> {
    if session_id.is_empty() || !session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
      return Err(AppError::Payment("Malformed payment session id".to_string()));
    }
    let response = self
      .client
      .get(format!("{}/{}", self.sessions_url(), session_id))
      .basic_auth(&self.secret_key, None::<&str>)
      .send()
      .await
      .map_err(|e| AppError::Payment(format!("Payment provider unreachable: {}", e)))?;
    let session = Self::decode(response).await?;
    Ok(PaymentSessionStatus {
      paid: session.payment_status.as_deref() == Some("paid"),
      id: session.id,
      amount_total: session.amount_total,
      currency: session.currency,
    })
  }
}
