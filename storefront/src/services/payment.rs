// storefront/src/services/payment.rs

//! Hosted-checkout payment provider seam.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::{AppConfig, PaymentProvider};
use crate::errors::{AppError, Result};
use crate::services::payment_mock::MockGateway;
use crate::services::payment_stripe::StripeGateway;

/// Placeholder the provider substitutes with the real session id in the
/// success redirect.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
  /// Total in the currency's minor unit (cents).
  pub amount_minor: i64,
  pub currency: String,
  pub product_name: String,
  pub success_url: String,
  pub cancel_url: String,
  pub client_reference_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
  pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSessionStatus {
  pub id: String,
  pub paid: bool,
  pub amount_total: Option<i64>,
  pub currency: Option<String>,
}

impl PaymentSessionStatus {
  /// True when the provider reports the session as paid for exactly this
  /// amount and currency.
  pub fn settles(&self, amount_minor: i64, currency: &str) -> bool {
    self.paid
      && self.amount_total == Some(amount_minor)
      && self
        .currency
        .as_deref()
        .map(|c| c.eq_ignore_ascii_case(currency))
        .unwrap_or(false)
  }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  fn publishable_key(&self) -> &str;
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<PaymentSession>;
  async fn retrieve_session(&self, session_id: &str) -> Result<PaymentSessionStatus>;
}

/// Converts a two-decimal money amount to integer minor units.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
  let scaled = amount * Decimal::ONE_HUNDRED;
  if !scaled.fract().is_zero() {
    return Err(AppError::Payment(format!("Amount {} has sub-cent precision", amount)));
  }
  scaled
    .to_i64()
    .filter(|v| *v > 0)
    .ok_or_else(|| AppError::Payment(format!("Amount {} cannot be charged", amount)))
}

pub fn build_gateway(config: &AppConfig) -> Result<Arc<dyn PaymentGateway>> {
  match config.payment_provider {
    PaymentProvider::Stripe => Ok(Arc::new(StripeGateway::from_config(config)?)),
    PaymentProvider::Mock => {
      tracing::warn!("Using the mock payment gateway; no real charges will be made.");
      Ok(Arc::new(MockGateway::new(config.mock_payment_auto_confirm)))
    }
  }
}
