// storefront/src/db/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use super::{
  cart_changed_since_checkout, line_quantity_exceeded, CartRepository, CategoryRepository, CheckoutDraftRepository,
  OrderRepository, ProductRepository,
};
use crate::errors::{AppError, Result};
use crate::models::cart_line::MAX_LINE_QUANTITY;
use crate::models::{
  CartLine, CartLineView, CartTotals, Category, CheckoutDraft, Order, OrderDetailView, OrderWithDetails, Product,
  ProductInput, ProductListing,
};

const FOREIGN_KEY_VIOLATION: &str = "23503";

const PRODUCT_LISTING_SELECT: &str = r#"
  SELECT p.id, p.name, p.price, p.description, p.image, p.category_id, c.name AS category_name
  FROM products p
  JOIN categories c ON c.id = p.category_id
"#;

const ORDER_COLUMNS: &str = "id, order_date, customer_id, address, city, province, postal_code, total";

/// Turns a foreign-key violation into a `WriteConflict` carrying `message`.
fn conflict_on_fk(err: sqlx::Error, message: &str) -> AppError {
  let is_fk = err
    .as_database_error()
    .and_then(|db| db.code())
    .map(|code| code == FOREIGN_KEY_VIOLATION)
    .unwrap_or(false);
  if is_fk {
    AppError::WriteConflict(message.to_string())
  } else {
    AppError::Sqlx(err)
  }
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

#[async_trait]
impl CategoryRepository for PgStore {
  async fn list(&self) -> Result<Vec<Category>> {
    let rows = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name, id")
      .fetch_all(&self.pool)
      .await?;
    Ok(rows)
  }

  async fn find(&self, id: i64) -> Result<Option<Category>> {
    let row = sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row)
  }

  #[instrument(name = "db::category_create", skip(self))]
  async fn create(&self, name: &str) -> Result<Category> {
    let row = sqlx::query_as::<_, Category>("INSERT INTO categories (name) VALUES ($1) RETURNING id, name")
      .bind(name)
      .fetch_one(&self.pool)
      .await?;
    Ok(row)
  }

  #[instrument(name = "db::category_update", skip(self))]
  async fn update(&self, id: i64, name: &str) -> Result<Option<Category>> {
    let row = sqlx::query_as::<_, Category>("UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name")
      .bind(id)
      .bind(name)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row)
  }

  #[instrument(name = "db::category_delete", skip(self))]
  async fn delete(&self, id: i64) -> Result<bool> {
    let done = sqlx::query("DELETE FROM categories WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(|e| conflict_on_fk(e, "Category still has products."))?;
    Ok(done.rows_affected() > 0)
  }
}

#[async_trait]
impl ProductRepository for PgStore {
  async fn list_with_category(&self) -> Result<Vec<ProductListing>> {
    let sql = format!("{} ORDER BY p.name, p.id", PRODUCT_LISTING_SELECT);
    let rows = sqlx::query_as::<_, ProductListing>(&sql).fetch_all(&self.pool).await?;
    Ok(rows)
  }

  async fn list_by_category(&self, category_id: i64) -> Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(
      "SELECT id, name, price, description, image, category_id FROM products WHERE category_id = $1 ORDER BY name, id",
    )
    .bind(category_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(rows)
  }

  async fn find(&self, id: i64) -> Result<Option<ProductListing>> {
    let sql = format!("{} WHERE p.id = $1", PRODUCT_LISTING_SELECT);
    let row = sqlx::query_as::<_, ProductListing>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row)
  }

  async fn price_of(&self, id: i64) -> Result<Option<Decimal>> {
    let price = sqlx::query_scalar::<_, Decimal>("SELECT price FROM products WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(price)
  }

  #[instrument(name = "db::product_create", skip(self, input), fields(name = %input.name))]
  async fn create(&self, input: &ProductInput) -> Result<Product> {
    let row = sqlx::query_as::<_, Product>(
      r#"
      INSERT INTO products (name, price, description, image, category_id)
      VALUES ($1, $2, $3, $4, $5)
      RETURNING id, name, price, description, image, category_id
      "#,
    )
    .bind(&input.name)
    .bind(input.price)
    .bind(&input.description)
    .bind(&input.image)
    .bind(input.category_id)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| conflict_on_fk(e, "Category no longer exists."))?;
    Ok(row)
  }

  #[instrument(name = "db::product_update", skip(self, input))]
  async fn update(&self, id: i64, input: &ProductInput) -> Result<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(
      r#"
      UPDATE products
      SET name = $2, price = $3, description = $4, image = $5, category_id = $6
      WHERE id = $1
      RETURNING id, name, price, description, image, category_id
      "#,
    )
    .bind(id)
    .bind(&input.name)
    .bind(input.price)
    .bind(&input.description)
    .bind(&input.image)
    .bind(input.category_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| conflict_on_fk(e, "Category no longer exists."))?;
    Ok(row)
  }

  #[instrument(name = "db::product_delete", skip(self))]
  async fn delete(&self, id: i64) -> Result<bool> {
    let done = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await
      .map_err(|e| conflict_on_fk(e, "Product appears in existing orders."))?;
    Ok(done.rows_affected() > 0)
  }
}

#[async_trait]
impl CartRepository for PgStore {
  #[instrument(name = "db::cart_add", skip(self, session))]
  async fn add_or_increment(
    &self,
    session: &str,
    product_id: i64,
    quantity: i32,
    unit_price: Decimal,
  ) -> Result<CartLine> {
    let line = sqlx::query_as::<_, CartLine>(
      r#"
      INSERT INTO cart_lines (product_id, quantity, price, customer_session, created_at)
      VALUES ($1, $2, $3, $4, NOW())
      ON CONFLICT (customer_session, product_id) DO UPDATE
      SET quantity = cart_lines.quantity + EXCLUDED.quantity
      WHERE cart_lines.quantity::BIGINT + EXCLUDED.quantity <= $5
      RETURNING id, product_id, quantity, price, customer_session, created_at
      "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price)
    .bind(session)
    .bind(i64::from(MAX_LINE_QUANTITY))
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| match conflict_on_fk(e, "Product no longer exists.") {
      AppError::WriteConflict(_) => AppError::not_found("Product"),
      other => other,
    })?;
    // No row back means the conflicting line was left alone by the cap.
    line.ok_or_else(|| line_quantity_exceeded(product_id, quantity))
  }

  async fn lines(&self, session: &str) -> Result<Vec<CartLineView>> {
    let rows = sqlx::query_as::<_, CartLineView>(
      r#"
      SELECT c.id, c.product_id, p.name AS product_name, p.image AS product_image,
             c.quantity, c.price, (c.price * c.quantity) AS line_total
      FROM cart_lines c
      JOIN products p ON p.id = c.product_id
      WHERE c.customer_session = $1
      ORDER BY c.id
      "#,
    )
    .bind(session)
    .fetch_all(&self.pool)
    .await?;
    Ok(rows)
  }

  async fn totals(&self, session: &str) -> Result<CartTotals> {
    let totals = sqlx::query_as::<_, CartTotals>(
      r#"
      SELECT COUNT(*) AS line_count,
             COALESCE(SUM(quantity), 0)::BIGINT AS item_count,
             COALESCE(SUM(price * quantity), 0)::NUMERIC AS total
      FROM cart_lines
      WHERE customer_session = $1
      "#,
    )
    .bind(session)
    .fetch_one(&self.pool)
    .await?;
    Ok(totals)
  }

  #[instrument(name = "db::cart_remove", skip(self, session))]
  async fn remove(&self, session: &str, line_id: i64) -> Result<bool> {
    let done = sqlx::query("DELETE FROM cart_lines WHERE id = $1 AND customer_session = $2")
      .bind(line_id)
      .bind(session)
      .execute(&self.pool)
      .await?;
    Ok(done.rows_affected() > 0)
  }
}

#[async_trait]
impl OrderRepository for PgStore {
  #[instrument(name = "db::place_order", skip(self, draft), fields(customer_id = %draft.customer_id))]
  async fn place_from_cart(&self, draft: &CheckoutDraft) -> Result<Order> {
    let mut tx = self.pool.begin().await?;

    let claimed = sqlx::query(
      "DELETE FROM checkout_drafts WHERE session_id = $1 AND payment_session_id IS NOT DISTINCT FROM $2",
    )
    .bind(&draft.session_id)
    .bind(&draft.payment_session_id)
    .execute(&mut *tx)
    .await?;
    if claimed.rows_affected() == 0 {
      tx.rollback().await?;
      return Err(AppError::not_found("Checkout"));
    }

    // Locks the lines being ordered; lines added concurrently are left in the cart.
    let lines = sqlx::query_as::<_, CartLine>(
      r#"
      SELECT id, product_id, quantity, price, customer_session, created_at
      FROM cart_lines
      WHERE customer_session = $1
      ORDER BY id
      FOR UPDATE
      "#,
    )
    .bind(&draft.session_id)
    .fetch_all(&mut *tx)
    .await?;
    let cart_total: Decimal = lines.iter().map(|l| l.price * Decimal::from(l.quantity)).sum();
    if lines.is_empty() || cart_total != draft.total {
      tx.rollback().await?;
      tracing::warn!(cart_total = %cart_total, draft_total = %draft.total, "Cart no longer matches the paid total.");
      return Err(cart_changed_since_checkout());
    }

    let insert_order = format!(
      "INSERT INTO orders (order_date, customer_id, address, city, province, postal_code, total) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
      ORDER_COLUMNS
    );
    let order = sqlx::query_as::<_, Order>(&insert_order)
      .bind(draft.order_date)
      .bind(&draft.customer_id)
      .bind(&draft.address)
      .bind(&draft.city)
      .bind(&draft.province)
      .bind(&draft.postal_code)
      .bind(draft.total)
      .fetch_one(&mut *tx)
      .await?;

    for line in &lines {
      sqlx::query("INSERT INTO order_details (order_id, product_id, quantity, cost) VALUES ($1, $2, $3, $4)")
        .bind(order.id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.price)
        .execute(&mut *tx)
        .await?;
    }

    let line_ids: Vec<i64> = lines.iter().map(|l| l.id).collect();
    sqlx::query("DELETE FROM cart_lines WHERE id = ANY($1)")
      .bind(&line_ids)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    tracing::info!(order_id = order.id, detail_count = lines.len(), "Order persisted.");
    Ok(order)
  }

  async fn list_all(&self) -> Result<Vec<Order>> {
    let sql = format!("SELECT {} FROM orders ORDER BY id DESC", ORDER_COLUMNS);
    let rows = sqlx::query_as::<_, Order>(&sql).fetch_all(&self.pool).await?;
    Ok(rows)
  }

  async fn list_for_customer(&self, customer_id: &str) -> Result<Vec<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE customer_id = $1 ORDER BY order_date DESC, id DESC",
      ORDER_COLUMNS
    );
    let rows = sqlx::query_as::<_, Order>(&sql)
      .bind(customer_id)
      .fetch_all(&self.pool)
      .await?;
    Ok(rows)
  }

  async fn find_with_details(&self, id: i64) -> Result<Option<OrderWithDetails>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    let Some(order) = sqlx::query_as::<_, Order>(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?
    else {
      return Ok(None);
    };
    let details = sqlx::query_as::<_, OrderDetailView>(
      r#"
      SELECT d.id, d.product_id, p.name AS product_name, d.quantity, d.cost
      FROM order_details d
      JOIN products p ON p.id = d.product_id
      WHERE d.order_id = $1
      ORDER BY d.id
      "#,
    )
    .bind(id)
    .fetch_all(&self.pool)
    .await?;
    Ok(Some(OrderWithDetails { order, details }))
  }
}

#[async_trait]
impl CheckoutDraftRepository for PgStore {
  #[instrument(name = "db::draft_upsert", skip(self, draft), fields(customer_id = %draft.customer_id))]
  async fn upsert(&self, draft: &CheckoutDraft) -> Result<()> {
    sqlx::query(
      r#"
      INSERT INTO checkout_drafts
        (session_id, customer_id, address, city, province, postal_code, total, order_date, payment_session_id, expires_at)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NULL, $9)
      ON CONFLICT (session_id) DO UPDATE
      SET customer_id = EXCLUDED.customer_id,
          address = EXCLUDED.address,
          city = EXCLUDED.city,
          province = EXCLUDED.province,
          postal_code = EXCLUDED.postal_code,
          total = EXCLUDED.total,
          order_date = EXCLUDED.order_date,
          payment_session_id = NULL,
          expires_at = EXCLUDED.expires_at
      "#,
    )
    .bind(&draft.session_id)
    .bind(&draft.customer_id)
    .bind(&draft.address)
    .bind(&draft.city)
    .bind(&draft.province)
    .bind(&draft.postal_code)
    .bind(draft.total)
    .bind(draft.order_date)
    .bind(draft.expires_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn find_live(&self, session_id: &str, now: DateTime<Utc>) -> Result<Option<CheckoutDraft>> {
    let row = sqlx::query_as::<_, CheckoutDraft>(
      r#"
      SELECT session_id, customer_id, address, city, province, postal_code, total, order_date,
             payment_session_id, expires_at
      FROM checkout_drafts
      WHERE session_id = $1 AND expires_at > $2
      "#,
    )
    .bind(session_id)
    .bind(now)
    .fetch_optional(&self.pool)
    .await?;
    Ok(row)
  }

  async fn set_payment_session(&self, session_id: &str, payment_session_id: &str, now: DateTime<Utc>) -> Result<bool> {
    let done = sqlx::query(
      "UPDATE checkout_drafts SET payment_session_id = $2 WHERE session_id = $1 AND expires_at > $3",
    )
    .bind(session_id)
    .bind(payment_session_id)
    .bind(now)
    .execute(&self.pool)
    .await?;
    Ok(done.rows_affected() > 0)
  }

  async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
    let done = sqlx::query("DELETE FROM checkout_drafts WHERE expires_at <= $1")
      .bind(now)
      .execute(&self.pool)
      .await?;
    Ok(done.rows_affected())
  }
}
