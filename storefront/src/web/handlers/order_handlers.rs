// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::services::access_policy::{authorize, can_view_order, Requirement};
use crate::state::AppState;
use crate::web::extractors::Principal;

#[instrument(name = "handler::list_orders", skip_all)]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
) -> Result<HttpResponse, AppError> {
  let principal = authorize(principal.as_ref(), Requirement::Authenticated)?;
  let orders = if principal.is_admin() {
    app_state.repos.orders.list_all().await?
  } else {
    app_state.repos.orders.list_for_customer(&principal.name).await?
  };
  info!(count = orders.len(), admin = principal.is_admin(), "Listing orders.");
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(name = "handler::order_details", skip(app_state, principal, path), fields(order_id = %path.as_ref()))]
pub async fn order_details_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let principal = authorize(principal.as_ref(), Requirement::Authenticated)?;
  let order = app_state
    .repos
    .orders
    .find_with_details(path.into_inner())
    .await?
    .ok_or_else(|| AppError::not_found("Order"))?;
  // Someone else's order answers exactly like a missing one.
  if !can_view_order(principal, &order.order) {
    warn!(user = %principal.name, "Order belongs to another customer.");
    return Err(AppError::not_found("Order"));
  }
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}
