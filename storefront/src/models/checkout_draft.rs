// storefront/src/models/checkout_draft.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Order header held server-side between the checkout form and the payment
/// provider's success redirect. Keyed by the shopper's cart session.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CheckoutDraft {
  pub session_id: String,
  pub customer_id: String,
  pub address: String,
  pub city: String,
  pub province: String,
  pub postal_code: String,
  pub total: Decimal,
  pub order_date: DateTime<Utc>,
  pub payment_session_id: Option<String>,
  pub expires_at: DateTime<Utc>,
}

impl CheckoutDraft {
  pub fn is_live(&self, now: DateTime<Utc>) -> bool {
    self.expires_at > now
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
  #[validate(length(min = 1, max = 255, message = "Address is required."))]
  pub address: String,
  #[validate(length(min = 1, max = 100, message = "City is required."))]
  pub city: String,
  #[validate(length(min = 1, max = 100, message = "Province is required."))]
  pub province: String,
  #[validate(length(min = 1, max = 20, message = "Postal code is required."))]
  pub postal_code: String,
}

impl ShippingAddress {
  pub fn normalized(self) -> Self {
    Self {
      address: self.address.trim().to_string(),
      city: self.city.trim().to_string(),
      province: self.province.trim().to_string(),
      postal_code: self.postal_code.trim().to_string(),
    }
  }
}
