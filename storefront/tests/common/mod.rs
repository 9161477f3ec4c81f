// tests/common/mod.rs
#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::test::TestRequest;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tempfile::TempDir;
use tracing::Level;

use storefront::db::Repositories;
use storefront::models::{Category, Product, ProductInput};
use storefront::services::payment::PaymentGateway;
use storefront::services::payment_mock::MockGateway;
use storefront::web::extractors::{ROLES_HEADER, USER_HEADER};
use storefront::web::SESSION_COOKIE;
use storefront::{AppConfig, AppState};

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Application state over the in-memory store and a mock gateway whose
/// sessions stay unpaid until `gateway.mark_paid` is called.
pub struct TestShop {
  pub state: AppState,
  pub gateway: Arc<MockGateway>,
  pub upload_dir: TempDir,
}

pub fn test_shop() -> TestShop {
  test_shop_with(&[], MockGateway::new(false))
}

/// Like `test_shop`, with `overrides` layered over the test configuration and
/// a caller-chosen gateway.
pub fn test_shop_with(overrides: &[(&str, &str)], gateway: MockGateway) -> TestShop {
  setup_tracing();
  let upload_dir = tempfile::tempdir().expect("temp upload dir");
  let session_key = "s".repeat(64);
  let upload_path = upload_dir.path().to_string_lossy().to_string();
  let config = AppConfig::from_lookup(|name| {
    if let Some((_, value)) = overrides.iter().find(|(key, _)| *key == name) {
      return Some(value.to_string());
    }
    match name {
      "DATABASE_URL" => Some("postgres://unused".to_string()),
      "SESSION_KEY" => Some(session_key.clone()),
      "COOKIE_SECURE" => Some("false".to_string()),
      "APP_BASE_URL" => Some("http://shop.test".to_string()),
      "UPLOAD_DIR" => Some(upload_path.clone()),
      _ => None,
    }
  })
  .expect("test config");

  let gateway = Arc::new(gateway);
  let payments: Arc<dyn PaymentGateway> = gateway.clone();
  let state = AppState::new(Arc::new(config), Repositories::in_memory(), payments);
  TestShop {
    state,
    gateway,
    upload_dir,
  }
}

pub async fn add_category(shop: &TestShop, name: &str) -> Category {
  shop.state.repos.categories.create(name).await.expect("create category")
}

pub async fn add_product(shop: &TestShop, category: &Category, name: &str, price: &str) -> Product {
  shop
    .state
    .repos
    .products
    .create(&ProductInput {
      name: name.to_string(),
      price: Decimal::from_str(price).expect("price"),
      description: None,
      category_id: category.id,
      image: None,
    })
    .await
    .expect("create product")
}

/// Carries the session cookie between requests and, once signed in, the
/// identity headers set by the fronting identity provider.
#[derive(Default)]
pub struct Browser {
  cookie: Option<Cookie<'static>>,
  user: Option<String>,
  roles: Option<String>,
}

impl Browser {
  pub fn anonymous() -> Self {
    Self::default()
  }

  pub fn customer(name: &str) -> Self {
    Self {
      user: Some(name.to_string()),
      ..Self::default()
    }
  }

  pub fn admin(name: &str) -> Self {
    Self {
      user: Some(name.to_string()),
      roles: Some("Administrator".to_string()),
      ..Self::default()
    }
  }

  pub fn sign_in(&mut self, name: &str) {
    self.user = Some(name.to_string());
  }

  pub fn prepare(&self, mut req: TestRequest) -> TestRequest {
    if let Some(cookie) = &self.cookie {
      req = req.cookie(cookie.clone());
    }
    if let Some(user) = &self.user {
      req = req.insert_header((USER_HEADER, user.as_str()));
    }
    if let Some(roles) = &self.roles {
      req = req.insert_header((ROLES_HEADER, roles.as_str()));
    }
    req
  }

  pub fn absorb<B>(&mut self, resp: &ServiceResponse<B>) {
    if let Some(cookie) = resp.response().cookies().find(|c| c.name() == SESSION_COOKIE) {
      self.cookie = Some(cookie.into_owned());
    }
  }
}

/// Sends `$req` as `$browser` and keeps any refreshed session cookie.
#[allow(unused_macros)]
macro_rules! send {
  ($app:expr, $browser:expr, $req:expr) => {{
    let resp = actix_web::test::call_service(&$app, $browser.prepare($req).to_request()).await;
    $browser.absorb(&resp);
    resp
  }};
}

pub fn location<B>(resp: &ServiceResponse<B>) -> String {
  resp
    .headers()
    .get(header::LOCATION)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
    .to_string()
}

pub fn decimal(value: &serde_json::Value) -> Decimal {
  let raw = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
  Decimal::from_str(&raw).expect("decimal field")
}

/// Hand-rolled `multipart/form-data` body: text fields plus an optional
/// `(field, file name, bytes)` upload.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> (String, Vec<u8>) {
  let boundary = "storefront-test-boundary";
  let mut body = Vec::new();
  for (name, value) in fields {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
  }
  if let Some((name, file_name, bytes)) = file {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
      format!(
        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
        name, file_name
      )
      .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
  }
  body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
  (format!("multipart/form-data; boundary={}", boundary), body)
}
