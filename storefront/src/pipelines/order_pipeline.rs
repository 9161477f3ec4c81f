// storefront/src/pipelines/order_pipeline.rs

use std::sync::Arc;

use storefront_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::pipelines::checkout_pipeline::load_live_draft;
use crate::pipelines::contexts::ConfirmOrderCtxData;
use crate::services::payment::to_minor_units;

const PAYMENT_NOT_VERIFIED: &str = "Payment could not be verified.";

pub fn register_confirm_order_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<ConfirmOrderCtxData, AppError>::new(&[
    ("load_checkout_draft", false, None),
    ("verify_payment", false, None),
    ("persist_order", false, None),
  ]);

  p.on_root("load_checkout_draft", |ctx_data: ContextData<ConfirmOrderCtxData>| {
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

  // The returned id must be the one recorded for this draft, and the
  // provider must report it paid for the draft's exact amount.
  p.on_root("verify_payment", |ctx_data: ContextData<ConfirmOrderCtxData>| {
    Box::pin(async move {
      let (draft, returned, app_state) = {
        let guard = ctx_data.read();
        (
          guard.draft.clone(),
          guard.returned_session_id.clone(),
          guard.app_state.clone(),
        )
      };
      let draft = draft.ok_or_else(|| AppError::Internal("Draft missing before verification.".to_string()))?;
      let expected = match (returned, draft.payment_session_id.clone()) {
        (Some(returned), Some(recorded)) if returned == recorded => recorded,
        _ => {
          warn!("Order Pipeline: returned payment session does not match the draft.");
          return Err(AppError::Payment(PAYMENT_NOT_VERIFIED.to_string()));
        }
      };
      let status = app_state.payments.retrieve_session(&expected).await?;
      let amount_minor = to_minor_units(draft.total)?;
      if !status.settles(amount_minor, &app_state.config.payment_currency) {
        warn!(
          paid = status.paid,
          amount_total = ?status.amount_total,
          expected_amount = amount_minor,
          "Order Pipeline: provider did not confirm payment."
        );
        return Err(AppError::Payment(PAYMENT_NOT_VERIFIED.to_string()));
      }
      Ok(PipelineControl::Continue)
    })
  });

  p.on_root("persist_order", |ctx_data: ContextData<ConfirmOrderCtxData>| {
    Box::pin(async move {
      let (draft, app_state) = {
        let guard = ctx_data.read();
        (guard.draft.clone(), guard.app_state.clone())
      };
      let draft = draft.ok_or_else(|| AppError::Internal("Draft missing before persisting.".to_string()))?;
      // Fails with a conflict, keeping draft and cart, if the cart was edited
      // after the paid total was fixed.
      let order = app_state.repos.orders.place_from_cart(&draft).await?;
      info!(order_id = order.id, total = %order.total, "Order Pipeline: order placed.");
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
}
