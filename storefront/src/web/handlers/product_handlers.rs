// storefront/src/web/handlers/product_handlers.rs

use std::str::FromStr;

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::see_other;
use crate::errors::{AppError, Result, ValidationFailure};
use crate::models::product::MIN_PRICE;
use crate::models::ProductInput;
use crate::services::access_policy::{authorize, Requirement};
use crate::services::image_store::PUBLIC_PREFIX;
use crate::state::AppState;
use crate::web::extractors::Principal;

/// Create/edit form. Every field arrives as text so malformed values come
/// back as field errors rather than a bare 400.
#[derive(Debug, MultipartForm)]
pub struct ProductUpload {
  pub name: Option<Text<String>>,
  pub price: Option<Text<String>>,
  pub description: Option<Text<String>>,
  pub category_id: Option<Text<String>>,
  /// Stored file name of the existing image, round-tripped by the edit form.
  pub current_image: Option<Text<String>>,
  /// Bounded by `MAX_UPLOAD_BYTES` through the app-wide `MultipartFormConfig`.
  pub image: Option<TempFile>,
}

fn text(field: &Option<Text<String>>) -> Option<String> {
  field.as_ref().map(|t| t.0.trim().to_string())
}

fn parse_price(raw: &str) -> std::result::Result<Decimal, &'static str> {
  if raw.is_empty() {
    return Err("Price is required.");
  }
  let price = Decimal::from_str(raw).map_err(|_| "Price must be a number.")?;
  if price.normalize().scale() > 2 {
    return Err("Price may have at most two decimal places.");
  }
  Ok(price)
}

/// Parses and validates the text fields. `fallback_image` is used when the
/// form carries no `current_image` field at all.
async fn product_input(app_state: &AppState, form: &ProductUpload, fallback_image: Option<String>) -> Result<ProductInput> {
  let name = text(&form.name).unwrap_or_default();
  let raw_price = text(&form.price).unwrap_or_default();
  let raw_category = text(&form.category_id).unwrap_or_default();
  let description = text(&form.description).filter(|d| !d.is_empty());
  let image = match text(&form.current_image) {
    Some(current) if current.is_empty() => None,
    Some(current) => Some(current),
    None => fallback_image,
  };

  let mut failure = ValidationFailure::new(json!({
    "name": name,
    "price": raw_price,
    "description": description,
    "category_id": raw_category,
    "current_image": image,
  }));

  let price = match parse_price(&raw_price) {
    Ok(price) => Some(price),
    Err(message) => {
      failure.add("price", message);
      None
    }
  };
  let category_id = match raw_category.parse::<i64>() {
    Ok(id) => Some(id),
    Err(_) => {
      failure.add("category_id", "Category is required.");
      None
    }
  };

  let input = ProductInput {
    name,
    price: price.unwrap_or(MIN_PRICE),
    description,
    category_id: category_id.unwrap_or_default(),
    image,
  };
  if let Err(errs) = input.validate() {
    failure.merge(&errs);
  }
  if let Some(id) = category_id {
    if app_state.repos.categories.find(id).await?.is_none() {
      failure.add("category_id", "Category does not exist.");
    }
  }
  if !failure.is_empty() {
    return Err(failure.into());
  }
  Ok(input)
}

/// Stores a newly uploaded image, if any, and points `input` at it.
async fn attach_upload(app_state: &AppState, form: &ProductUpload, input: &mut ProductInput) -> Result<()> {
  let Some(upload) = form.image.as_ref().filter(|f| f.size > 0) else {
    return Ok(());
  };
  let stored = app_state
    .images
    .save(upload.file_name.as_deref(), upload.file.path())
    .await?;
  input.image = Some(stored);
  Ok(())
}

#[instrument(name = "handler::list_products", skip_all)]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  let products = app_state.repos.products.list_with_category().await?;
  info!(count = products.len(), "Listing products.");
  Ok(HttpResponse::Ok().json(json!({ "products": products, "image_base": PUBLIC_PREFIX })))
}

#[instrument(name = "handler::product_details", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn product_details_handler(app_state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse> {
  let product = app_state
    .repos
    .products
    .find(path.into_inner())
    .await?
    .ok_or_else(|| AppError::not_found("Product"))?;
  Ok(HttpResponse::Ok().json(json!({ "product": product, "image_base": PUBLIC_PREFIX })))
}

pub async fn create_product_form_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  let categories = app_state.repos.categories.list().await?;
  Ok(HttpResponse::Ok().json(json!({ "categories": categories })))
}

#[instrument(name = "handler::create_product", skip_all)]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
  MultipartForm(form): MultipartForm<ProductUpload>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  let mut input = product_input(&app_state, &form, None).await?;
  attach_upload(&app_state, &form, &mut input).await?;
  let product = app_state.repos.products.create(&input).await?;
  info!(product_id = product.id, image = ?product.image, "Product created.");
  Ok(see_other("/products"))
}

#[instrument(name = "handler::edit_product_form", skip(app_state, principal, path), fields(product_id = %path.as_ref()))]
pub async fn edit_product_form_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
  path: web::Path<i64>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  let product = app_state
    .repos
    .products
    .find(path.into_inner())
    .await?
    .ok_or_else(|| AppError::not_found("Product"))?;
  let categories = app_state.repos.categories.list().await?;
  Ok(HttpResponse::Ok().json(json!({
    "product": product,
    "categories": categories,
    "image_base": PUBLIC_PREFIX,
  })))
}

#[instrument(name = "handler::edit_product", skip(app_state, principal, path, form), fields(product_id = %path.as_ref()))]
pub async fn edit_product_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
  path: web::Path<i64>,
  MultipartForm(form): MultipartForm<ProductUpload>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  let id = path.into_inner();
  let existing = app_state
    .repos
    .products
    .find(id)
    .await?
    .ok_or_else(|| AppError::not_found("Product"))?;

  let mut input = product_input(&app_state, &form, existing.product.image.clone()).await?;
  attach_upload(&app_state, &form, &mut input).await?;

  if app_state.repos.products.update(id, &input).await?.is_some() {
    info!(image = ?input.image, "Product updated.");
    return Ok(see_other("/products"));
  }
  if app_state.repos.products.find(id).await?.is_some() {
    warn!("Product update affected no rows.");
    return Err(AppError::WriteConflict("Product was changed by someone else.".to_string()));
  }
  Err(AppError::not_found("Product"))
}

#[instrument(name = "handler::confirm_delete_product", skip(app_state, principal, path), fields(product_id = %path.as_ref()))]
pub async fn confirm_delete_product_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
  path: web::Path<i64>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  let product = app_state
    .repos
    .products
    .find(path.into_inner())
    .await?
    .ok_or_else(|| AppError::not_found("Product"))?;
  Ok(HttpResponse::Ok().json(json!({ "product": product })))
}

#[instrument(name = "handler::delete_product", skip(app_state, principal, path), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
  path: web::Path<i64>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  if !app_state.repos.products.delete(path.into_inner()).await? {
    info!("Product already gone.");
  }
  Ok(see_other("/products"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn price_parsing_reports_field_messages() {
    assert_eq!(parse_price("12.50").unwrap(), Decimal::new(1250, 2));
    assert_eq!(parse_price("12.500").unwrap(), Decimal::new(1250, 2));
    assert_eq!(parse_price(""), Err("Price is required."));
    assert_eq!(parse_price("twelve"), Err("Price must be a number."));
    assert_eq!(parse_price("1.999"), Err("Price may have at most two decimal places."));
  }
}
