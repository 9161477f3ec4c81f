// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Largest total the `NUMERIC(12, 2)` order and draft columns can hold.
pub fn max_order_total() -> Decimal {
  Decimal::new(999_999_999_999, 2)
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Order {
  pub id: i64,
  pub order_date: DateTime<Utc>,
  pub customer_id: String,
  pub address: String,
  pub city: String,
  pub province: String,
  pub postal_code: String,
  pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct OrderDetail {
  pub id: i64,
  pub order_id: i64,
  pub product_id: i64,
  pub quantity: i32,
  pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct OrderDetailView {
  pub id: i64,
  pub product_id: i64,
  pub product_name: String,
  pub quantity: i32,
  pub cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderWithDetails {
  #[serde(flatten)]
  pub order: Order,
  pub details: Vec<OrderDetailView>,
}
