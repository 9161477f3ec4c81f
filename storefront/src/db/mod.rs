// storefront/src/db/mod.rs

//! Repository seams over the relational store. `PgStore` backs production;
//! `MemoryStore` keeps the same contracts in-process for tests and demos.

pub mod memory;
pub mod postgres;
pub mod seed;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::errors::{AppError, Result, ValidationFailure};
use crate::models::cart_line::MAX_LINE_QUANTITY;
use crate::models::{
  CartLine, CartLineView, CartTotals, Category, CheckoutDraft, Order, OrderWithDetails, Product, ProductInput,
  ProductListing,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Rejection for an add that would push a line past `MAX_LINE_QUANTITY`.
pub(crate) fn line_quantity_exceeded(product_id: i64, quantity: i32) -> AppError {
  AppError::Validation(ValidationFailure::single(
    "quantity",
    format!("A cart line can hold at most {} units of a product.", MAX_LINE_QUANTITY),
    serde_json::json!({ "product_id": product_id, "quantity": quantity }),
  ))
}

/// Raised when the cart no longer adds up to the total a checkout was paid for.
pub(crate) fn cart_changed_since_checkout() -> AppError {
  AppError::WriteConflict("Your cart changed after payment was started. Please check out again.".to_string())
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
  /// All categories ordered by name.
  async fn list(&self) -> Result<Vec<Category>>;
  async fn find(&self, id: i64) -> Result<Option<Category>>;
  async fn create(&self, name: &str) -> Result<Category>;
  /// `None` when no row with `id` exists.
  async fn update(&self, id: i64, name: &str) -> Result<Option<Category>>;
  /// Fails with `WriteConflict` while products still reference the category.
  async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
  async fn list_with_category(&self) -> Result<Vec<ProductListing>>;
  async fn list_by_category(&self, category_id: i64) -> Result<Vec<Product>>;
  async fn find(&self, id: i64) -> Result<Option<ProductListing>>;
  async fn price_of(&self, id: i64) -> Result<Option<Decimal>>;
  async fn create(&self, input: &ProductInput) -> Result<Product>;
  async fn update(&self, id: i64, input: &ProductInput) -> Result<Option<Product>>;
  /// Removes the product and any cart lines holding it. Fails with
  /// `WriteConflict` while order history references it.
  async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
  /// Adds `quantity` to the session's line for `product_id`, creating the line
  /// with `unit_price` when absent. The stored price of an existing line is kept.
  /// Fails with a `quantity` validation error, leaving the line unchanged, when
  /// the merged quantity would exceed `MAX_LINE_QUANTITY`.
  async fn add_or_increment(&self, session: &str, product_id: i64, quantity: i32, unit_price: Decimal)
    -> Result<CartLine>;
  async fn lines(&self, session: &str) -> Result<Vec<CartLineView>>;
  async fn totals(&self, session: &str) -> Result<CartTotals>;
  /// Deletes the line only when it belongs to `session`.
  async fn remove(&self, session: &str, line_id: i64) -> Result<bool>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
  /// Atomically claims `draft`, writes the order header and one detail per cart
  /// line of the draft's session, then removes those lines. Returns `NotFound`
  /// when the draft was already claimed or no longer matches, and
  /// `WriteConflict` without touching draft or cart when the lines no longer
  /// sum to `draft.total`.
  async fn place_from_cart(&self, draft: &CheckoutDraft) -> Result<Order>;
  /// Newest order id first.
  async fn list_all(&self) -> Result<Vec<Order>>;
  /// Newest order date first.
  async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<Order>>;
  async fn find_with_details(&self, id: i64) -> Result<Option<OrderWithDetails>>;
}

#[async_trait]
pub trait CheckoutDraftRepository: Send + Sync {
  /// Replaces any draft for the same session and clears its payment session id.
  async fn upsert(&self, draft: &CheckoutDraft) -> Result<()>;
  async fn find_live(&self, session_id: &str, now: DateTime<Utc>) -> Result<Option<CheckoutDraft>>;
  async fn set_payment_session(&self, session_id: &str, payment_session_id: &str, now: DateTime<Utc>) -> Result<bool>;
  async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[derive(Clone)]
pub struct Repositories {
  pub categories: Arc<dyn CategoryRepository>,
  pub products: Arc<dyn ProductRepository>,
  pub carts: Arc<dyn CartRepository>,
  pub orders: Arc<dyn OrderRepository>,
  pub drafts: Arc<dyn CheckoutDraftRepository>,
}

impl Repositories {
  pub fn postgres(pool: sqlx::PgPool) -> Self {
    let store = Arc::new(PgStore::new(pool));
    Self {
      categories: store.clone(),
      products: store.clone(),
      carts: store.clone(),
      orders: store.clone(),
      drafts: store,
    }
  }

  pub fn in_memory() -> Self {
    Self::from_memory(Arc::new(MemoryStore::default()))
  }

  pub fn from_memory(store: Arc<MemoryStore>) -> Self {
    Self {
      categories: store.clone(),
      products: store.clone(),
      carts: store.clone(),
      orders: store.clone(),
      drafts: store,
    }
  }
}
