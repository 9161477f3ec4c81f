// storefront/src/pipelines/mod.rs

//! Defines and registers all pipelines used by the storefront.

use std::sync::Arc;

use storefront_flow::FlowRegistry;

use crate::errors::AppError;

pub mod contexts;

pub mod cart_pipeline;
pub mod checkout_pipeline;
pub mod order_pipeline;

/// Registers every pipeline with `registry`. Called once while building
/// `AppState`.
pub fn register_all_pipelines(registry: &Arc<FlowRegistry<AppError>>) {
  tracing::info!("Registering storefront pipelines...");

  cart_pipeline::register_add_to_cart_pipeline(registry);
  checkout_pipeline::register_checkout_draft_pipeline(registry);
  checkout_pipeline::register_payment_session_pipeline(registry);
  order_pipeline::register_confirm_order_pipeline(registry);

  tracing::info!("All storefront pipelines registered.");
}
