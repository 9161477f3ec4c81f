// storefront/src/web/handlers/shop_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::services::image_store::PUBLIC_PREFIX;
use crate::state::AppState;

#[instrument(name = "handler::shop_index", skip(app_state))]
pub async fn shop_index_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let categories = app_state.repos.categories.list().await?;
  Ok(HttpResponse::Ok().json(json!({ "categories": categories })))
}

#[instrument(name = "handler::browse_category", skip(app_state, path), fields(category_id = %path.as_ref()))]
pub async fn browse_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let category_id = path.into_inner();
  let category = app_state
    .repos
    .categories
    .find(category_id)
    .await?
    .ok_or_else(|| AppError::not_found("Category"))?;
  let products = app_state.repos.products.list_by_category(category_id).await?;
  info!(count = products.len(), "Browsing category.");
  Ok(HttpResponse::Ok().json(json!({
    "category": category,
    "products": products,
    "image_base": PUBLIC_PREFIX,
  })))
}
