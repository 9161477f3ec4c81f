// storefront/src/web/handlers/mod.rs

use actix_web::{http::header, HttpResponse};
use storefront_flow::PipelineResult;

use crate::errors::AppError;

pub mod cart_handlers;
pub mod category_handlers;
pub mod checkout_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod shop_handlers;

/// 303 to `location`; form posts land on a GET page.
pub fn see_other(location: &str) -> HttpResponse {
  HttpResponse::SeeOther()
    .insert_header((header::LOCATION, location.to_string()))
    .finish()
}

/// None of the storefront pipelines stop early on success, so a stop is
/// reported as an internal error naming the step.
pub fn require_completed(result: PipelineResult, flow: &str) -> Result<(), AppError> {
  match result {
    PipelineResult::Completed => Ok(()),
    PipelineResult::Stopped { step } => {
      tracing::warn!(flow, step = %step, "Pipeline was stopped by a handler.");
      Err(AppError::Internal(format!("{} halted at step '{}'.", flow, step)))
    }
  }
}
