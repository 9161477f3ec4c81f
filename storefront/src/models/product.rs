// storefront/src/models/product.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

pub const MIN_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
pub const MAX_PRICE: Decimal = Decimal::from_parts(999_999, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Product {
  pub id: i64,
  pub name: String,
  pub price: Decimal,
  pub description: Option<String>,
  /// File name under the upload directory, e.g. `3f2c…-shirt.png`.
  pub image: Option<String>,
  pub category_id: i64,
}

/// A product joined with its category's name, as shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ProductListing {
  #[serde(flatten)]
  #[sqlx(flatten)]
  pub product: Product,
  pub category_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductInput {
  #[validate(length(min = 1, max = 255, message = "Name is required and must be at most 255 characters."))]
  pub name: String,
  #[validate(custom(function = "validate_price"))]
  pub price: Decimal,
  pub description: Option<String>,
  pub category_id: i64,
  pub image: Option<String>,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
  if *price < MIN_PRICE || *price > MAX_PRICE {
    let mut err = ValidationError::new("range");
    err.message = Some(format!("Price must be between {} and {}.", MIN_PRICE, MAX_PRICE).into());
    return Err(err);
  }
  Ok(())
}
