// storefront/src/models/cart_line.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Most units of one product a single cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 999;

/// One product in one shopper's cart. `price` is the unit price captured when
/// the line was first created.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CartLine {
  pub id: i64,
  pub product_id: i64,
  pub quantity: i32,
  pub price: Decimal,
  pub customer_session: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CartLineView {
  pub id: i64,
  pub product_id: i64,
  pub product_name: String,
  pub product_image: Option<String>,
  pub quantity: i32,
  pub price: Decimal,
  pub line_total: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct CartTotals {
  pub line_count: i64,
  pub item_count: i64,
  pub total: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartForm {
  pub product_id: i64,
  pub quantity: i32,
}
