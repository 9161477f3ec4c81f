// storefront/src/web/handlers/cart_handlers.rs

use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde_json::json;
use storefront_flow::ContextData;
use tracing::{info, instrument, warn};

use super::{require_completed, see_other};
use crate::errors::AppError;
use crate::models::AddToCartForm;
use crate::pipelines::contexts::AddToCartCtxData;
use crate::services::image_store::PUBLIC_PREFIX;
use crate::services::session_identity::{current_customer_id, get_or_create_customer_id, item_count, set_item_count};
use crate::state::AppState;

#[instrument(
  name = "handler::add_to_cart",
  skip(app_state, session, form),
  fields(product_id = form.product_id, quantity = form.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  session: Session,
  form: web::Form<AddToCartForm>,
) -> Result<HttpResponse, AppError> {
  let customer_session = get_or_create_customer_id(&session)?;
  let form = form.into_inner();

  let ctx = ContextData::new(AddToCartCtxData {
    app_state: app_state.get_ref().clone(),
    customer_session: customer_session.clone(),
    product_id: form.product_id,
    quantity: form.quantity,
    unit_price: None,
    cart_line: None,
  });

  match app_state.flows.run(ctx.clone()).await {
    Ok(result) => {
      require_completed(result, "add_to_cart")?;
      let totals = app_state.repos.carts.totals(&customer_session).await?;
      set_item_count(&session, totals.item_count)?;
      info!(item_count = totals.item_count, "Item added to cart.");
      Ok(see_other("/shop/cart"))
    }
    Err(app_err) => {
      warn!(error = %app_err, "Add to Cart pipeline failed.");
      Err(app_err)
    }
  }
}

#[instrument(name = "handler::view_cart", skip(app_state, session))]
pub async fn view_cart_handler(app_state: web::Data<AppState>, session: Session) -> Result<HttpResponse, AppError> {
  let Some(customer_session) = current_customer_id(&session)? else {
    set_item_count(&session, 0)?;
    return Ok(HttpResponse::Ok().json(json!({
      "lines": [],
      "total": rust_decimal::Decimal::ZERO,
      "item_count": 0,
      "image_base": PUBLIC_PREFIX,
    })));
  };
  let lines = app_state.repos.carts.lines(&customer_session).await?;
  let totals = app_state.repos.carts.totals(&customer_session).await?;
  set_item_count(&session, totals.item_count)?;
  Ok(HttpResponse::Ok().json(json!({
    "lines": lines,
    "total": totals.total,
    "item_count": totals.item_count,
    "image_base": PUBLIC_PREFIX,
  })))
}

/// Header badge count, read from the session cache without touching the store.
pub async fn cart_summary_handler(session: Session) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(json!({ "item_count": item_count(&session)? })))
}

#[instrument(name = "handler::confirm_remove_from_cart", skip(app_state, session, path), fields(line_id = %path.as_ref()))]
pub async fn confirm_remove_handler(
  app_state: web::Data<AppState>,
  session: Session,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let line_id = path.into_inner();
  let customer_session = current_customer_id(&session)?.ok_or_else(|| AppError::not_found("Cart line"))?;
  let line = app_state
    .repos
    .carts
    .lines(&customer_session)
    .await?
    .into_iter()
    .find(|l| l.id == line_id)
    .ok_or_else(|| AppError::not_found("Cart line"))?;
  Ok(HttpResponse::Ok().json(json!({ "line": line })))
}

#[instrument(name = "handler::remove_from_cart", skip(app_state, session, path), fields(line_id = %path.as_ref()))]
pub async fn remove_from_cart_handler(
  app_state: web::Data<AppState>,
  session: Session,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let line_id = path.into_inner();
  if let Some(customer_session) = current_customer_id(&session)? {
    let removed = app_state.repos.carts.remove(&customer_session, line_id).await?;
    if !removed {
      warn!("Cart line not in this cart; nothing removed.");
    }
    let totals = app_state.repos.carts.totals(&customer_session).await?;
    set_item_count(&session, totals.item_count)?;
  }
  Ok(see_other("/shop/cart"))
}
