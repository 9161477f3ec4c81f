// storefront/src/pipelines/checkout_pipeline.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use storefront_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::errors::{AppError, Result, ValidationFailure};
use crate::models::order::max_order_total;
use crate::models::CheckoutDraft;
use crate::pipelines::contexts::{CheckoutDraftCtxData, PaymentSessionCtxData};
use crate::services::payment::{to_minor_units, CheckoutSessionRequest, SESSION_ID_PLACEHOLDER};
use crate::state::AppState;

/// Loads the unexpired draft for `customer_session`. A missing, expired or
/// foreign draft is reported as not found.
#[instrument(name = "checkout::load_live_draft", skip(app_state, customer_session))]
pub async fn load_live_draft(app_state: &AppState, customer_session: &str, customer_id: &str) -> Result<CheckoutDraft> {
  let draft = app_state
    .repos
    .drafts
    .find_live(customer_session, Utc::now())
    .await?
    .filter(|d| d.customer_id == customer_id);
  draft.ok_or_else(|| AppError::not_found("Checkout"))
}

pub fn register_checkout_draft_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<CheckoutDraftCtxData, AppError>::new(&[
    ("validate_shipping_address", false, None),
    ("load_cart_total", false, None),
    ("store_checkout_draft", false, None),
  ]);

  p.on_root("validate_shipping_address", |ctx_data: ContextData<CheckoutDraftCtxData>| {
    Box::pin(async move {
      let shipping = { ctx_data.read().shipping.clone() }.normalized();
      if let Err(errs) = shipping.validate() {
        let input = serde_json::to_value(&shipping).unwrap_or_default();
        return Err(AppError::Validation(ValidationFailure::from_errors(&errs, input)));
      }
      ctx_data.write().shipping = shipping;
      Ok(PipelineControl::Continue)
    })
  });

  p.on_root("load_cart_total", |ctx_data: ContextData<CheckoutDraftCtxData>| {
    Box::pin(async move {
      let (session, shipping, carts) = {
        let guard = ctx_data.read();
        (
          guard.customer_session.clone(),
          guard.shipping.clone(),
          guard.app_state.repos.carts.clone(),
        )
      };
      let totals = carts.totals(&session).await?;
      if totals.line_count == 0 {
        warn!("Checkout Pipeline: cart is empty.");
        let input = serde_json::to_value(&shipping).unwrap_or_default();
        return Err(AppError::Validation(ValidationFailure::single(
          "cart",
          "Your cart is empty.",
          input,
        )));
      }
      if totals.total > max_order_total() {
        warn!(total = %totals.total, "Checkout Pipeline: cart total exceeds the order limit.");
        let input = serde_json::to_value(&shipping).unwrap_or_default();
        return Err(AppError::Validation(ValidationFailure::single(
          "cart",
          format!("Orders are limited to a total of {}.", max_order_total()),
          input,
        )));
      }
      ctx_data.write().cart_total = Some(totals.total);
      Ok(PipelineControl::Continue)
    })
  });

  p.on_root("store_checkout_draft", |ctx_data: ContextData<CheckoutDraftCtxData>| {
    Box::pin(async move {
      let (session, customer_id, shipping, total, drafts, ttl_minutes) = {
        let guard = ctx_data.read();
        (
          guard.customer_session.clone(),
          guard.customer_id.clone(),
          guard.shipping.clone(),
          guard.cart_total,
          guard.app_state.repos.drafts.clone(),
          guard.app_state.config.checkout_draft_ttl_minutes,
        )
      };
      let total = total.ok_or_else(|| AppError::Internal("Cart total missing before draft.".to_string()))?;
      let now = Utc::now();
      let purged = drafts.purge_expired(now).await?;
      if purged > 0 {
        info!(purged, "Checkout Pipeline: purged expired drafts.");
      }
      let draft = CheckoutDraft {
        session_id: session,
        customer_id,
        address: shipping.address,
        city: shipping.city,
        province: shipping.province,
        postal_code: shipping.postal_code,
        total,
        order_date: now,
        payment_session_id: None,
        expires_at: now + Duration::minutes(ttl_minutes),
      };
      drafts.upsert(&draft).await?;
      info!(total = %draft.total, "Checkout Pipeline: draft stored.");
      ctx_data.write().draft = Some(draft);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
}

pub fn register_payment_session_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<PaymentSessionCtxData, AppError>::new(&[
    ("load_checkout_draft", false, None),
    ("open_payment_session", false, None),
    ("record_payment_session", false, None),
  ]);

  p.on_root("load_checkout_draft", |ctx_data: ContextData<PaymentSessionCtxData>| {
    Box::pin(async move {
      let (app_state, session, customer_id) = {
        let guard = ctx_data.read();
        (
          guard.app_state.clone(),
          guard.customer_session.clone(),
          guard.customer_id.clone(),
        )
      };
      let draft = load_live_draft(&app_state, &session, &customer_id).await?;
      ctx_data.write().draft = Some(draft);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("open_payment_session", |ctx_data: ContextData<PaymentSessionCtxData>| {
    Box::pin(async move {
      let (draft, app_state) = {
        let guard = ctx_data.read();
        (guard.draft.clone(), guard.app_state.clone())
      };
      let draft = draft.ok_or_else(|| AppError::Internal("Draft missing before payment.".to_string()))?;
      let config = &app_state.config;
      let request = CheckoutSessionRequest {
        amount_minor: to_minor_units(draft.total)?,
        currency: config.payment_currency.clone(),
        product_name: format!("{} Purchase", config.store_name),
        success_url: format!(
          "{}/shop/save-order?session_id={}",
          config.app_base_url, SESSION_ID_PLACEHOLDER
        ),
        cancel_url: format!("{}/shop/cart", config.app_base_url),
        client_reference_id: draft.session_id.clone(),
      };
      let session = app_state.payments.create_checkout_session(&request).await?;
      info!(payment_session_id = %session.id, "Payment Pipeline: hosted session opened.");
      ctx_data.write().payment_session = Some(session);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("record_payment_session", |ctx_data: ContextData<PaymentSessionCtxData>| {
    Box::pin(async move {
      let (session, payment_session, drafts) = {
        let guard = ctx_data.read();
        (
          guard.customer_session.clone(),
          guard.payment_session.clone(),
          guard.app_state.repos.drafts.clone(),
        )
      };
      let payment_session =
        payment_session.ok_or_else(|| AppError::Internal("Payment session missing.".to_string()))?;
      if !drafts.set_payment_session(&session, &payment_session.id, Utc::now()).await? {
        return Err(AppError::not_found("Checkout"));
      }
      Ok(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
}
