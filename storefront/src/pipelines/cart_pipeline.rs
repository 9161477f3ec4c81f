// storefront/src/pipelines/cart_pipeline.rs

use std::sync::Arc;

use serde_json::json;
use storefront_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl};
use tracing::{info, warn};

use crate::errors::{AppError, ValidationFailure};
use crate::models::cart_line::MAX_LINE_QUANTITY;
use crate::pipelines::contexts::AddToCartCtxData;

pub const MAX_QUANTITY_PER_ADD: i32 = MAX_LINE_QUANTITY;

pub fn register_add_to_cart_pipeline(registry: &Arc<FlowRegistry<AppError>>) {
  let mut p = Pipeline::<AddToCartCtxData, AppError>::new(&[
    ("validate_cart_input", false, None),
    ("fetch_product_price", false, None),
    ("merge_cart_line", false, None),
  ]);

  p.on_root("validate_cart_input", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (product_id, quantity) = {
        let guard = ctx_data.read();
        (guard.product_id, guard.quantity)
      };
      if !(1..=MAX_QUANTITY_PER_ADD).contains(&quantity) {
        warn!(quantity, "Add to Cart Pipeline: quantity out of range.");
        return Err(AppError::Validation(ValidationFailure::single(
          "quantity",
          format!("Quantity must be between 1 and {}.", MAX_QUANTITY_PER_ADD),
          json!({ "product_id": product_id, "quantity": quantity }),
        )));
      }
      Ok(PipelineControl::Continue)
    })
  });

  p.on_root("fetch_product_price", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (product_id, products) = {
        let guard = ctx_data.read();
        (guard.product_id, guard.app_state.repos.products.clone())
      };
      let price = products
        .price_of(product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
      ctx_data.write().unit_price = Some(price);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("merge_cart_line", |ctx_data: ContextData<AddToCartCtxData>| {
    Box::pin(async move {
      let (session, product_id, quantity, unit_price, carts) = {
        let guard = ctx_data.read();
        (
          guard.customer_session.clone(),
          guard.product_id,
          guard.quantity,
          guard.unit_price,
          guard.app_state.repos.carts.clone(),
        )
      };
      let unit_price =
        unit_price.ok_or_else(|| AppError::Internal("Unit price missing before cart merge.".to_string()))?;
      let line = carts.add_or_increment(&session, product_id, quantity, unit_price).await?;
      info!(
        line_id = line.id,
        product_id,
        quantity = line.quantity,
        "Add to Cart Pipeline: cart line merged."
      );
      ctx_data.write().cart_line = Some(line);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
}
