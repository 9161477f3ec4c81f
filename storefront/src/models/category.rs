// storefront/src/models/category.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Category {
  pub id: i64,
  pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CategoryInput {
  #[validate(length(min = 1, max = 255, message = "Name is required and must be at most 255 characters."))]
  pub name: String,
}

impl CategoryInput {
  pub fn normalized(self) -> Self {
    Self {
      name: self.name.trim().to_string(),
    }
  }
}
