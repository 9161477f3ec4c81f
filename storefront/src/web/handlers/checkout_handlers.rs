// storefront/src/web/handlers/checkout_handlers.rs

use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront_flow::ContextData;
use tracing::{info, instrument, warn};

use super::{require_completed, see_other};
use crate::errors::{AppError, ValidationFailure};
use crate::models::ShippingAddress;
use crate::pipelines::checkout_pipeline::load_live_draft;
use crate::pipelines::contexts::{CheckoutDraftCtxData, ConfirmOrderCtxData, PaymentSessionCtxData};
use crate::services::access_policy::{authorize, Requirement};
use crate::services::session_identity::{current_customer_id, set_item_count};
use crate::state::AppState;
use crate::web::extractors::Principal;

#[derive(Debug, Deserialize)]
pub struct SaveOrderQuery {
  pub session_id: Option<String>,
}

fn checkout_session(session: &Session) -> Result<String, AppError> {
  current_customer_id(session)?.ok_or_else(|| AppError::not_found("Checkout"))
}

#[instrument(name = "handler::checkout_form", skip_all)]
pub async fn checkout_form_handler(
  app_state: web::Data<AppState>,
  session: Session,
  principal: Option<Principal>,
) -> Result<HttpResponse, AppError> {
  authorize(principal.as_ref(), Requirement::Authenticated)?;
  let total = match current_customer_id(&session)? {
    Some(customer_session) => app_state.repos.carts.totals(&customer_session).await?.total,
    None => rust_decimal::Decimal::ZERO,
  };
  Ok(HttpResponse::Ok().json(json!({
    "form": ShippingAddress::default(),
    "cart_total": total,
  })))
}

#[instrument(name = "handler::submit_checkout", skip_all, fields(user = tracing::field::Empty))]
pub async fn submit_checkout_handler(
  app_state: web::Data<AppState>,
  session: Session,
  principal: Option<Principal>,
  form: web::Form<ShippingAddress>,
) -> Result<HttpResponse, AppError> {
  let principal = authorize(principal.as_ref(), Requirement::Authenticated)?;
  tracing::Span::current().record("user", principal.name.as_str());
  let shipping = form.into_inner();

  let Some(customer_session) = current_customer_id(&session)? else {
    let input = serde_json::to_value(&shipping).unwrap_or_default();
    return Err(AppError::Validation(ValidationFailure::single(
      "cart",
      "Your cart is empty.",
      input,
    )));
  };

  let ctx = ContextData::new(CheckoutDraftCtxData {
    app_state: app_state.get_ref().clone(),
    customer_session,
    customer_id: principal.name.clone(),
    shipping,
    cart_total: None,
    draft: None,
  });
  let result = app_state.flows.run(ctx.clone()).await?;
  require_completed(result, "checkout_draft")?;
  info!("Checkout draft stored; continuing to payment.");
  Ok(see_other("/shop/payment"))
}

#[instrument(name = "handler::payment_page", skip_all)]
pub async fn payment_page_handler(
  app_state: web::Data<AppState>,
  session: Session,
  principal: Option<Principal>,
) -> Result<HttpResponse, AppError> {
  let principal = authorize(principal.as_ref(), Requirement::Authenticated)?;
  let customer_session = checkout_session(&session)?;
  let draft = load_live_draft(&app_state, &customer_session, &principal.name).await?;
  Ok(HttpResponse::Ok().json(json!({
    "total": draft.total,
    "currency": app_state.config.payment_currency,
    "publishable_key": app_state.payments.publishable_key(),
    "store_name": app_state.config.store_name,
    "shipping": {
      "address": draft.address,
      "city": draft.city,
      "province": draft.province,
      "postal_code": draft.postal_code,
    },
  })))
}

#[instrument(name = "handler::process_payment", skip_all)]
pub async fn process_payment_handler(
  app_state: web::Data<AppState>,
  session: Session,
  principal: Option<Principal>,
) -> Result<HttpResponse, AppError> {
  let principal = authorize(principal.as_ref(), Requirement::Authenticated)?;
  let customer_session = checkout_session(&session)?;

  let ctx = ContextData::new(PaymentSessionCtxData {
    app_state: app_state.get_ref().clone(),
    customer_session,
    customer_id: principal.name.clone(),
    draft: None,
    payment_session: None,
  });
  let result = app_state.flows.run(ctx.clone()).await?;
  require_completed(result, "payment_session")?;

  let session_id = ctx
    .read()
    .payment_session
    .as_ref()
    .map(|s| s.id.clone())
    .ok_or_else(|| AppError::Internal("Payment session was not recorded.".to_string()))?;
  Ok(HttpResponse::Ok().json(json!({ "id": session_id })))
}

#[instrument(name = "handler::save_order", skip_all)]
pub async fn save_order_handler(
  app_state: web::Data<AppState>,
  session: Session,
  principal: Option<Principal>,
  query: web::Query<SaveOrderQuery>,
) -> Result<HttpResponse, AppError> {
  let principal = authorize(principal.as_ref(), Requirement::Authenticated)?;
  let customer_session = checkout_session(&session)?;

  let ctx = ContextData::new(ConfirmOrderCtxData {
    app_state: app_state.get_ref().clone(),
    customer_session,
    customer_id: principal.name.clone(),
    returned_session_id: query.into_inner().session_id,
    draft: None,
    order: None,
  });
  match app_state.flows.run(ctx.clone()).await {
    Ok(result) => {
      require_completed(result, "confirm_order")?;
      let order_id = ctx
        .read()
        .order
        .as_ref()
        .map(|o| o.id)
        .ok_or_else(|| AppError::Internal("Order was not recorded.".to_string()))?;
      set_item_count(&session, 0)?;
      Ok(see_other(&format!("/orders/{}", order_id)))
    }
    Err(app_err) => {
      warn!(error = %app_err, "Order confirmation failed.");
      Err(app_err)
    }
  }
}
