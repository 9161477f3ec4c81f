// tests/admin_tests.rs
#[macro_use]
mod common;

use actix_web::cookie::Key;
use actix_web::http::{header, StatusCode};
use actix_web::test::{self, TestRequest};
use rust_decimal::Decimal;
use serde_json::Value;

use common::*;
use storefront::services::payment_mock::MockGateway;
use storefront::web::build_app;

fn multipart_post(uri: &str, fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> TestRequest {
  let (content_type, body) = multipart_body(fields, file);
  TestRequest::post()
    .uri(uri)
    .insert_header((header::CONTENT_TYPE, content_type))
    .set_payload(body)
}

#[actix_web::test]
async fn administration_requires_the_administrator_role() {
  let shop = test_shop();
  let app = test::init_service(build_app(shop.state.clone(), Key::generate(), false)).await;
  let mut anonymous = Browser::anonymous();
  let mut shopper = Browser::customer("alice");

  for uri in ["/products", "/categories", "/products/create", "/categories/create"] {
    let resp = send!(app, anonymous, TestRequest::get().uri(uri));
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    let resp = send!(app, shopper, TestRequest::get().uri(uri));
    assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{}", uri);
  }

  let resp = send!(
    app,
    shopper,
    TestRequest::post().uri("/categories/create").set_form([("name", "Shoes")])
  );
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  assert!(shop.state.repos.categories.list().await.unwrap().is_empty());
}

#[actix_web::test]
async fn categories_crud_round_trip() {
  let shop = test_shop();
  let app = test::init_service(build_app(shop.state.clone(), Key::generate(), false)).await;
  let mut admin = Browser::admin("root");

  let resp = send!(
    app,
    admin,
    TestRequest::post().uri("/categories/create").set_form([("name", "  Shoes ")])
  );
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp), "/categories");
  let created = shop.state.repos.categories.list().await.unwrap().remove(0);
  assert_eq!(created.name, "Shoes");

  let resp = send!(
    app,
    admin,
    TestRequest::post().uri("/categories/create").set_form([("name", "   ")])
  );
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

  let resp = send!(
    app,
    admin,
    TestRequest::post()
      .uri(&format!("/categories/{}/edit", created.id))
      .set_form([("name", "Footwear")])
  );
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  let resp = send!(app, admin, TestRequest::get().uri(&format!("/categories/{}", created.id)));
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["category"]["name"], "Footwear");

  let resp = send!(
    app,
    admin,
    TestRequest::post().uri("/categories/9999/edit").set_form([("name", "Ghost")])
  );
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  add_product(&shop, &created, "Boot", "120.00").await;
  let resp = send!(
    app,
    admin,
    TestRequest::post().uri(&format!("/categories/{}/delete", created.id))
  );
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn product_upload_stores_a_prefixed_image_and_edit_keeps_it() {
  let shop = test_shop();
  let shirts = add_category(&shop, "Shirts").await;
  let app = test::init_service(build_app(shop.state.clone(), Key::generate(), false)).await;
  let mut admin = Browser::admin("root");
  let category_id = shirts.id.to_string();

  let resp = send!(
    app,
    admin,
    multipart_post(
      "/products/create",
      &[
        ("name", "Linen Shirt"),
        ("price", "59.90"),
        ("description", "Breathable."),
        ("category_id", &category_id),
      ],
      Some(("image", "../summer shirt.png", b"fake-png-bytes")),
    )
  );
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  assert_eq!(location(&resp), "/products");

  let listing = shop.state.repos.products.list_with_category().await.unwrap();
  assert_eq!(listing.len(), 1);
  let product = &listing[0].product;
  assert_eq!(product.price, Decimal::new(5990, 2));
  let image = product.image.clone().unwrap();
  assert!(image.ends_with("-summer_shirt.png"), "{}", image);
  let stored = std::fs::read(shop.upload_dir.path().join(&image)).unwrap();
  assert_eq!(stored, b"fake-png-bytes");

  let resp = send!(
    app,
    admin,
    multipart_post(
      &format!("/products/{}/edit", product.id),
      &[
        ("name", "Linen Shirt"),
        ("price", "54.90"),
        ("category_id", &category_id),
        ("current_image", &image),
      ],
      None,
    )
  );
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  let updated = shop.state.repos.products.find(product.id).await.unwrap().unwrap();
  assert_eq!(updated.product.image.as_deref(), Some(image.as_str()));
  assert_eq!(updated.product.price, Decimal::new(5490, 2));
  assert_eq!(updated.product.description, None);

  let resp = send!(app, admin, TestRequest::get().uri(&format!("/img/product-uploads/{}", image)));
  assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn invalid_product_forms_echo_input_with_field_errors() {
  let shop = test_shop();
  let app = test::init_service(build_app(shop.state.clone(), Key::generate(), false)).await;
  let mut admin = Browser::admin("root");

  let resp = send!(
    app,
    admin,
    multipart_post(
      "/products/create",
      &[("name", ""), ("price", "free"), ("category_id", "77")],
      None,
    )
  );
  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["fields"]["name"].is_array());
  assert!(body["fields"]["price"].is_array());
  assert!(body["fields"]["category_id"].is_array());
  assert_eq!(body["input"]["price"], "free");
  assert!(shop.state.repos.products.list_with_category().await.unwrap().is_empty());
}

#[actix_web::test]
async fn product_listing_is_sorted_and_details_are_public() {
  let shop = test_shop();
  let shirts = add_category(&shop, "Shirts").await;
  let hats = add_category(&shop, "Hats").await;
  add_product(&shop, &shirts, "Zip Hoodie", "65.00").await;
  let cap = add_product(&shop, &hats, "Ball Cap", "22.00").await;
  add_product(&shop, &shirts, "Henley", "35.00").await;
  let app = test::init_service(build_app(shop.state.clone(), Key::generate(), false)).await;
  let mut admin = Browser::admin("root");
  let mut anonymous = Browser::anonymous();

  let resp = send!(app, admin, TestRequest::get().uri("/products"));
  let body: Value = test::read_body_json(resp).await;
  let rows = body["products"].as_array().unwrap();
  let names: Vec<&str> = rows.iter().map(|p| p["name"].as_str().unwrap()).collect();
  assert_eq!(names, vec!["Ball Cap", "Henley", "Zip Hoodie"]);
  assert_eq!(rows[0]["category_name"], "Hats");

  let resp = send!(app, anonymous, TestRequest::get().uri(&format!("/products/{}", cap.id)));
  assert_eq!(resp.status(), StatusCode::OK);
  let resp = send!(app, anonymous, TestRequest::get().uri("/products/31337"));
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = send!(app, admin, TestRequest::post().uri(&format!("/products/{}/delete", cap.id)));
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  let resp = send!(app, admin, TestRequest::get().uri(&format!("/products/{}/delete", cap.id)));
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn image_size_follows_the_configured_upload_limit() {
  let shop = test_shop_with(&[("MAX_UPLOAD_BYTES", "8388608")], MockGateway::new(false));
  let shirts = add_category(&shop, "Shirts").await;
  let app = test::init_service(build_app(shop.state.clone(), Key::generate(), false)).await;
  let mut admin = Browser::admin("root");
  let category_id = shirts.id.to_string();
  let six_megabytes = vec![7u8; 6 * 1024 * 1024];

  let resp = send!(
    app,
    admin,
    multipart_post(
      "/products/create",
      &[("name", "Poster"), ("price", "15.00"), ("category_id", &category_id)],
      Some(("image", "poster.png", &six_megabytes)),
    )
  );
  assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  let listing = shop.state.repos.products.list_with_category().await.unwrap();
  let image = listing[0].product.image.clone().unwrap();
  let stored = std::fs::metadata(shop.upload_dir.path().join(&image)).unwrap();
  assert_eq!(stored.len(), six_megabytes.len() as u64);
}

#[actix_web::test]
async fn uploads_over_the_limit_are_refused() {
  let shop = test_shop_with(&[("MAX_UPLOAD_BYTES", "1048576")], MockGateway::new(false));
  let shirts = add_category(&shop, "Shirts").await;
  let app = test::init_service(build_app(shop.state.clone(), Key::generate(), false)).await;
  let mut admin = Browser::admin("root");
  let category_id = shirts.id.to_string();
  let two_megabytes = vec![7u8; 2 * 1024 * 1024];

  let resp = send!(
    app,
    admin,
    multipart_post(
      "/products/create",
      &[("name", "Poster"), ("price", "15.00"), ("category_id", &category_id)],
      Some(("image", "poster.png", &two_megabytes)),
    )
  );
  assert!(resp.status().is_client_error(), "{}", resp.status());
  assert!(shop.state.repos.products.list_with_category().await.unwrap().is_empty());
}
