// storefront/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{
  cart_handlers, category_handlers, checkout_handlers, order_handlers, product_handlers, shop_handlers,
};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/health", web::get().to(health_check_handler))
    // Storefront: browsing, cart and checkout
    .service(
      web::scope("/shop")
        .route("", web::get().to(shop_handlers::shop_index_handler))
        .route("/browse/{category_id}", web::get().to(shop_handlers::browse_category_handler))
        .route("/add-to-cart", web::post().to(cart_handlers::add_to_cart_handler))
        .route("/cart", web::get().to(cart_handlers::view_cart_handler))
        .route("/cart/summary", web::get().to(cart_handlers::cart_summary_handler))
        .route("/remove-from-cart/{line_id}", web::get().to(cart_handlers::confirm_remove_handler))
        .route("/remove-from-cart/{line_id}", web::post().to(cart_handlers::remove_from_cart_handler))
        .route("/checkout", web::get().to(checkout_handlers::checkout_form_handler))
        .route("/checkout", web::post().to(checkout_handlers::submit_checkout_handler))
        .route("/payment", web::get().to(checkout_handlers::payment_page_handler))
        .route("/process-payment", web::post().to(checkout_handlers::process_payment_handler))
        .route("/save-order", web::get().to(checkout_handlers::save_order_handler)),
    )
    .service(
      web::scope("/orders")
        .route("", web::get().to(order_handlers::list_orders_handler))
        .route("/{order_id}", web::get().to(order_handlers::order_details_handler)),
    )
    // Administration. `/create` is registered before `/{id}` so it is not
    // parsed as an id.
    .service(
      web::scope("/products")
        .route("", web::get().to(product_handlers::list_products_handler))
        .route("/create", web::get().to(product_handlers::create_product_form_handler))
        .route("/create", web::post().to(product_handlers::create_product_handler))
        .route("/{product_id}", web::get().to(product_handlers::product_details_handler))
        .route("/{product_id}/edit", web::get().to(product_handlers::edit_product_form_handler))
        .route("/{product_id}/edit", web::post().to(product_handlers::edit_product_handler))
        .route("/{product_id}/delete", web::get().to(product_handlers::confirm_delete_product_handler))
        .route("/{product_id}/delete", web::post().to(product_handlers::delete_product_handler)),
    )
    .service(
      web::scope("/categories")
        .route("", web::get().to(category_handlers::list_categories_handler))
        .route("/create", web::get().to(category_handlers::create_category_form_handler))
        .route("/create", web::post().to(category_handlers::create_category_handler))
        .route("/{category_id}", web::get().to(category_handlers::category_details_handler))
        .route("/{category_id}/edit", web::get().to(category_handlers::edit_category_form_handler))
        .route("/{category_id}/edit", web::post().to(category_handlers::edit_category_handler))
        .route(
          "/{category_id}/delete",
          web::get().to(category_handlers::confirm_delete_category_handler),
        )
        .route("/{category_id}/delete", web::post().to(category_handlers::delete_category_handler)),
    );
}
