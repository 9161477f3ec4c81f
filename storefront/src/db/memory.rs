// storefront/src/db/memory.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use super::{
  cart_changed_since_checkout, line_quantity_exceeded, CartRepository, CategoryRepository, CheckoutDraftRepository,
  OrderRepository, ProductRepository,
};
use crate::errors::{AppError, Result};
use crate::models::cart_line::MAX_LINE_QUANTITY;
use crate::models::{
  CartLine, CartLineView, CartTotals, Category, CheckoutDraft, Order, OrderDetail, OrderDetailView,
  OrderWithDetails, Product, ProductInput, ProductListing,
};

#[derive(Default)]
struct Tables {
  next_id: i64,
  categories: BTreeMap<i64, Category>,
  products: BTreeMap<i64, Product>,
  cart_lines: BTreeMap<i64, CartLine>,
  orders: BTreeMap<i64, Order>,
  order_details: BTreeMap<i64, OrderDetail>,
  drafts: HashMap<String, CheckoutDraft>,
}

impl Tables {
  fn next_id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }

  fn listing(&self, product: &Product) -> ProductListing {
    let category_name = self
      .categories
      .get(&product.category_id)
      .map(|c| c.name.clone())
      .unwrap_or_default();
    ProductListing {
      product: product.clone(),
      category_name,
    }
  }
}

/// In-process store with the same contracts as the Postgres backend. Every
/// operation runs under one lock, so multi-row writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
  tables: Mutex<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
  async fn list(&self) -> Result<Vec<Category>> {
    let tables = self.tables.lock();
    let mut rows: Vec<Category> = tables.categories.values().cloned().collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(rows)
  }

  async fn find(&self, id: i64) -> Result<Option<Category>> {
    Ok(self.tables.lock().categories.get(&id).cloned())
  }

  async fn create(&self, name: &str) -> Result<Category> {
    let mut tables = self.tables.lock();
    let category = Category {
      id: tables.next_id(),
      name: name.to_string(),
    };
    tables.categories.insert(category.id, category.clone());
    Ok(category)
  }

  async fn update(&self, id: i64, name: &str) -> Result<Option<Category>> {
    let mut tables = self.tables.lock();
    Ok(tables.categories.get_mut(&id).map(|c| {
      c.name = name.to_string();
      c.clone()
    }))
  }

  async fn delete(&self, id: i64) -> Result<bool> {
    let mut tables = self.tables.lock();
    if tables.products.values().any(|p| p.category_id == id) {
      return Err(AppError::WriteConflict("Category still has products.".to_string()));
    }
    Ok(tables.categories.remove(&id).is_some())
  }
}

#[async_trait]
impl ProductRepository for MemoryStore {
  async fn list_with_category(&self) -> Result<Vec<ProductListing>> {
    let tables = self.tables.lock();
    let mut rows: Vec<ProductListing> = tables.products.values().map(|p| tables.listing(p)).collect();
    rows.sort_by(|a, b| a.product.name.cmp(&b.product.name).then(a.product.id.cmp(&b.product.id)));
    Ok(rows)
  }

  async fn list_by_category(&self, category_id: i64) -> Result<Vec<Product>> {
    let tables = self.tables.lock();
    let mut rows: Vec<Product> = tables
      .products
      .values()
      .filter(|p| p.category_id == category_id)
      .cloned()
      .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    Ok(rows)
  }

  async fn find(&self, id: i64) -> Result<Option<ProductListing>> {
    let tables = self.tables.lock();
    Ok(tables.products.get(&id).map(|p| tables.listing(p)))
  }

  async fn price_of(&self, id: i64) -> Result<Option<Decimal>> {
    Ok(self.tables.lock().products.get(&id).map(|p| p.price))
  }

  async fn create(&self, input: &ProductInput) -> Result<Product> {
    let mut tables = self.tables.lock();
    if !tables.categories.contains_key(&input.category_id) {
      return Err(AppError::WriteConflict("Category no longer exists.".to_string()));
    }
    let product = Product {
      id: tables.next_id(),
      name: input.name.clone(),
      price: input.price,
      description: input.description.clone(),
      image: input.image.clone(),
      category_id: input.category_id,
    };
    tables.products.insert(product.id, product.clone());
    Ok(product)
  }

  async fn update(&self, id: i64, input: &ProductInput) -> Result<Option<Product>> {
    let mut tables = self.tables.lock();
    if !tables.categories.contains_key(&input.category_id) {
      return Err(AppError::WriteConflict("Category no longer exists.".to_string()));
    }
    Ok(tables.products.get_mut(&id).map(|p| {
      p.name = input.name.clone();
      p.price = input.price;
      p.description = input.description.clone();
      p.image = input.image.clone();
      p.category_id = input.category_id;
      p.clone()
    }))
  }

  async fn delete(&self, id: i64) -> Result<bool> {
    let mut tables = self.tables.lock();
    if tables.order_details.values().any(|d| d.product_id == id) {
      return Err(AppError::WriteConflict("Product appears in existing orders.".to_string()));
    }
    tables.cart_lines.retain(|_, line| line.product_id != id);
    Ok(tables.products.remove(&id).is_some())
  }
}

#[async_trait]
impl CartRepository for MemoryStore {
  async fn add_or_increment(
    &self,
    session: &str,
    product_id: i64,
    quantity: i32,
    unit_price: Decimal,
  ) -> Result<CartLine> {
    let mut tables = self.tables.lock();
    if !tables.products.contains_key(&product_id) {
      return Err(AppError::not_found("Product"));
    }
    if let Some(line) = tables
      .cart_lines
      .values_mut()
      .find(|l| l.customer_session == session && l.product_id == product_id)
    {
      let merged = line
        .quantity
        .checked_add(quantity)
        .filter(|q| *q <= MAX_LINE_QUANTITY)
        .ok_or_else(|| line_quantity_exceeded(product_id, quantity))?;
      line.quantity = merged;
      return Ok(line.clone());
    }
    let line = CartLine {
      id: tables.next_id(),
      product_id,
      quantity,
      price: unit_price,
      customer_session: session.to_string(),
      created_at: Utc::now(),
    };
    tables.cart_lines.insert(line.id, line.clone());
    Ok(line)
  }

  async fn lines(&self, session: &str) -> Result<Vec<CartLineView>> {
    let tables = self.tables.lock();
    let rows = tables
      .cart_lines
      .values()
      .filter(|l| l.customer_session == session)
      .filter_map(|l| {
        tables.products.get(&l.product_id).map(|p| CartLineView {
          id: l.id,
          product_id: l.product_id,
          product_name: p.name.clone(),
          product_image: p.image.clone(),
          quantity: l.quantity,
          price: l.price,
          line_total: l.price * Decimal::from(l.quantity),
        })
      })
      .collect();
    Ok(rows)
  }

  async fn totals(&self, session: &str) -> Result<CartTotals> {
    let tables = self.tables.lock();
    let totals = tables
      .cart_lines
      .values()
      .filter(|l| l.customer_session == session)
      .fold(CartTotals::default(), |mut acc, l| {
        acc.line_count += 1;
        acc.item_count += i64::from(l.quantity);
        acc.total += l.price * Decimal::from(l.quantity);
        acc
      });
    Ok(totals)
  }

  async fn remove(&self, session: &str, line_id: i64) -> Result<bool> {
    let mut tables = self.tables.lock();
    let owned = tables
      .cart_lines
      .get(&line_id)
      .map(|l| l.customer_session == session)
      .unwrap_or(false);
    if owned {
      tables.cart_lines.remove(&line_id);
    }
    Ok(owned)
  }
}

#[async_trait]
impl OrderRepository for MemoryStore {
  async fn place_from_cart(&self, draft: &CheckoutDraft) -> Result<Order> {
    let mut tables = self.tables.lock();
    let claimable = tables
      .drafts
      .get(&draft.session_id)
      .map(|d| d.payment_session_id == draft.payment_session_id)
      .unwrap_or(false);
    if !claimable {
      return Err(AppError::not_found("Checkout"));
    }

    let lines: Vec<CartLine> = tables
      .cart_lines
      .values()
      .filter(|l| l.customer_session == draft.session_id)
      .cloned()
      .collect();
    let cart_total: Decimal = lines.iter().map(|l| l.price * Decimal::from(l.quantity)).sum();
    if lines.is_empty() || cart_total != draft.total {
      return Err(cart_changed_since_checkout());
    }
    tables.drafts.remove(&draft.session_id);

    let order = Order {
      id: tables.next_id(),
      order_date: draft.order_date,
      customer_id: draft.customer_id.clone(),
      address: draft.address.clone(),
      city: draft.city.clone(),
      province: draft.province.clone(),
      postal_code: draft.postal_code.clone(),
      total: draft.total,
    };
    tables.orders.insert(order.id, order.clone());

    for line in &lines {
      let detail = OrderDetail {
        id: tables.next_id(),
        order_id: order.id,
        product_id: line.product_id,
        quantity: line.quantity,
        cost: line.price,
      };
      tables.order_details.insert(detail.id, detail);
      tables.cart_lines.remove(&line.id);
    }
    Ok(order)
  }

  async fn list_all(&self) -> Result<Vec<Order>> {
    Ok(self.tables.lock().orders.values().rev().cloned().collect())
  }

  async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<Order>> {
    let tables = self.tables.lock();
    let mut rows: Vec<Order> = tables
      .orders
      .values()
      .filter(|o| o.customer_id == customer_id)
      .cloned()
      .collect();
    rows.sort_by(|a, b| b.order_date.cmp(&a.order_date).then(b.id.cmp(&a.id)));
    Ok(rows)
  }

  async fn find_with_details(&self, id: i64) -> Result<Option<OrderWithDetails>> {
    let tables = self.tables.lock();
    let Some(order) = tables.orders.get(&id).cloned() else {
      return Ok(None);
    };
    let details = tables
      .order_details
      .values()
      .filter(|d| d.order_id == id)
      .map(|d| OrderDetailView {
        id: d.id,
        product_id: d.product_id,
        product_name: tables
          .products
          .get(&d.product_id)
          .map(|p| p.name.clone())
          .unwrap_or_default(),
        quantity: d.quantity,
        cost: d.cost,
      })
      .collect();
    Ok(Some(OrderWithDetails { order, details }))
  }
}

#[async_trait]
impl CheckoutDraftRepository for MemoryStore {
  async fn upsert(&self, draft: &CheckoutDraft) -> Result<()> {
    let mut stored = draft.clone();
    stored.payment_session_id = None;
    self.tables.lock().drafts.insert(stored.session_id.clone(), stored);
    Ok(())
  }

  async fn find_live(&self, session_id: &str, now: DateTime<Utc>) -> Result<Option<CheckoutDraft>> {
    let tables = self.tables.lock();
    Ok(tables.drafts.get(session_id).filter(|d| d.is_live(now)).cloned())
  }

  async fn set_payment_session(&self, session_id: &str, payment_session_id: &str, now: DateTime<Utc>) -> Result<bool> {
    let mut tables = self.tables.lock();
    match tables.drafts.get_mut(session_id).filter(|d| d.is_live(now)) {
      Some(draft) => {
        draft.payment_session_id = Some(payment_session_id.to_string());
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
    let mut tables = self.tables.lock();
    let before = tables.drafts.len();
    tables.drafts.retain(|_, d| d.is_live(now));
    Ok((before - tables.drafts.len()) as u64)
  }
}
