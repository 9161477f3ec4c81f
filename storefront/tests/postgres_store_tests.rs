// tests/postgres_store_tests.rs
//! Runs against a disposable database named by `STOREFRONT_TEST_DATABASE_URL`;
//! every test returns early when it is unset.
mod common;

use std::str::FromStr;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use uuid::Uuid;

use storefront::db::{
  CartRepository, CategoryRepository, CheckoutDraftRepository, OrderRepository, PgStore, ProductRepository,
};
use storefront::models::{CheckoutDraft, Product, ProductInput};
use storefront::AppError;

const TEST_DATABASE_URL: &str = "STOREFRONT_TEST_DATABASE_URL";

static MIGRATED: OnceCell<()> = OnceCell::const_new();

async fn test_store() -> Option<PgStore> {
  common::setup_tracing();
  let Ok(url) = std::env::var(TEST_DATABASE_URL) else {
    eprintln!("{} not set; skipping Postgres store test.", TEST_DATABASE_URL);
    return None;
  };
  let pool: PgPool = PgPoolOptions::new()
    .max_connections(4)
    .connect(&url)
    .await
    .expect("connect to test database");
  MIGRATED
    .get_or_init(|| async {
      sqlx::migrate!("./migrations").run(&pool).await.expect("apply migrations");
    })
    .await;
  Some(PgStore::new(pool))
}

/// A fresh category and product with a unique name, so runs never collide.
async fn stocked_product(store: &PgStore, price: &str) -> Product {
  let suffix = Uuid::new_v4().simple().to_string();
  let category = CategoryRepository::create(store, &format!("Shirts {}", suffix)).await.unwrap();
  ProductRepository::create(
    store,
    &ProductInput {
      name: format!("Tee {}", suffix),
      price: Decimal::from_str(price).unwrap(),
      description: None,
      category_id: category.id,
      image: None,
    },
  )
  .await
  .unwrap()
}

fn draft_for(session: &str, total: Decimal) -> CheckoutDraft {
  let now = Utc::now();
  CheckoutDraft {
    session_id: session.to_string(),
    customer_id: "alice".into(),
    address: "1 Spring Garden Rd".into(),
    city: "Halifax".into(),
    province: "NS".into(),
    postal_code: "B3J 1A1".into(),
    total,
    order_date: now,
    payment_session_id: None,
    expires_at: now + Duration::minutes(30),
  }
}

fn session_name() -> String {
  format!("pg-test-{}", Uuid::new_v4())
}

#[actix_web::test]
async fn cart_merge_keeps_one_line_and_caps_quantity() {
  let Some(store) = test_store().await else { return };
  let product = stocked_product(&store, "10.00").await;
  let session = session_name();

  store.add_or_increment(&session, product.id, 1, product.price).await.unwrap();
  let line = store
    .add_or_increment(&session, product.id, 2, Decimal::new(9999, 2))
    .await
    .unwrap();
  assert_eq!(line.quantity, 3);
  assert_eq!(line.price, Decimal::new(1000, 2));
  assert_eq!(store.lines(&session).await.unwrap().len(), 1);

  let err = store.add_or_increment(&session, product.id, 999, product.price).await.unwrap_err();
  assert!(matches!(err, AppError::Validation(_)));
  let totals = store.totals(&session).await.unwrap();
  assert_eq!(totals.item_count, 3);
  assert_eq!(totals.total, Decimal::new(3000, 2));

  let err = store.add_or_increment(&session, i64::MAX, 1, product.price).await.unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)));
}

#[actix_web::test]
async fn order_placement_claims_the_draft_exactly_once() {
  let Some(store) = test_store().await else { return };
  let product = stocked_product(&store, "12.50").await;
  let session = session_name();
  store.add_or_increment(&session, product.id, 2, product.price).await.unwrap();

  store.upsert(&draft_for(&session, Decimal::new(2500, 2))).await.unwrap();
  assert!(store.set_payment_session(&session, "cs_pg_1", Utc::now()).await.unwrap());
  let live = store.find_live(&session, Utc::now()).await.unwrap().unwrap();

  let order = store.place_from_cart(&live).await.unwrap();
  assert_eq!(order.total, Decimal::new(2500, 2));
  let placed = store.find_with_details(order.id).await.unwrap().unwrap();
  assert_eq!(placed.details.len(), 1);
  assert_eq!(placed.details[0].quantity, 2);
  assert_eq!(store.totals(&session).await.unwrap().line_count, 0);
  assert!(store.find_live(&session, Utc::now()).await.unwrap().is_none());

  let replay = store.place_from_cart(&live).await.unwrap_err();
  assert!(matches!(replay, AppError::NotFound(_)));
}

#[actix_web::test]
async fn changed_cart_rolls_back_the_claim() {
  let Some(store) = test_store().await else { return };
  let product = stocked_product(&store, "12.50").await;
  let session = session_name();
  store.add_or_increment(&session, product.id, 2, product.price).await.unwrap();
  store.upsert(&draft_for(&session, Decimal::new(2500, 2))).await.unwrap();
  store.set_payment_session(&session, "cs_pg_2", Utc::now()).await.unwrap();
  let live = store.find_live(&session, Utc::now()).await.unwrap().unwrap();

  store.add_or_increment(&session, product.id, 1, product.price).await.unwrap();
  let err = store.place_from_cart(&live).await.unwrap_err();
  assert!(matches!(err, AppError::WriteConflict(_)));

  let kept = store.find_live(&session, Utc::now()).await.unwrap().unwrap();
  assert_eq!(kept.payment_session_id.as_deref(), Some("cs_pg_2"));
  assert_eq!(store.totals(&session).await.unwrap().item_count, 3);
}

#[actix_web::test]
async fn referenced_rows_cannot_be_deleted() {
  let Some(store) = test_store().await else { return };
  let product = stocked_product(&store, "5.00").await;

  let err = CategoryRepository::delete(&store, product.category_id).await.unwrap_err();
  assert!(matches!(err, AppError::WriteConflict(_)));

  let session = session_name();
  store.add_or_increment(&session, product.id, 1, product.price).await.unwrap();
  store.upsert(&draft_for(&session, Decimal::new(500, 2))).await.unwrap();
  let live = store.find_live(&session, Utc::now()).await.unwrap().unwrap();
  store.place_from_cart(&live).await.unwrap();

  let err = ProductRepository::delete(&store, product.id).await.unwrap_err();
  assert!(matches!(err, AppError::WriteConflict(_)));
  assert!(!CategoryRepository::delete(&store, i64::MAX).await.unwrap());
}
