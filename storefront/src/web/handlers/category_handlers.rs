// storefront/src/web/handlers/category_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};
use validator::Validate;

use super::see_other;
use crate::errors::{AppError, Result, ValidationFailure};
use crate::models::CategoryInput;
use crate::services::access_policy::{authorize, Requirement};
use crate::state::AppState;
use crate::web::extractors::Principal;

fn validated(form: CategoryInput) -> Result<CategoryInput> {
  let form = form.normalized();
  if let Err(errs) = form.validate() {
    let input = serde_json::to_value(&form).unwrap_or_default();
    return Err(ValidationFailure::from_errors(&errs, input).into());
  }
  Ok(form)
}

#[instrument(name = "handler::list_categories", skip_all)]
pub async fn list_categories_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  let categories = app_state.repos.categories.list().await?;
  Ok(HttpResponse::Ok().json(json!({ "categories": categories })))
}

#[instrument(name = "handler::category_details", skip(app_state, principal, path), fields(category_id = %path.as_ref()))]
pub async fn category_details_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
  path: web::Path<i64>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  let category = app_state
    .repos
    .categories
    .find(path.into_inner())
    .await?
    .ok_or_else(|| AppError::not_found("Category"))?;
  Ok(HttpResponse::Ok().json(json!({ "category": category })))
}

pub async fn create_category_form_handler(principal: Option<Principal>) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  Ok(HttpResponse::Ok().json(json!({ "form": CategoryInput::default() })))
}

#[instrument(name = "handler::create_category", skip_all)]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
  form: web::Form<CategoryInput>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  let form = validated(form.into_inner())?;
  let category = app_state.repos.categories.create(&form.name).await?;
  info!(category_id = category.id, "Category created.");
  Ok(see_other("/categories"))
}

#[instrument(name = "handler::edit_category_form", skip(app_state, principal, path), fields(category_id = %path.as_ref()))]
pub async fn edit_category_form_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
  path: web::Path<i64>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  let category = app_state
    .repos
    .categories
    .find(path.into_inner())
    .await?
    .ok_or_else(|| AppError::not_found("Category"))?;
  Ok(HttpResponse::Ok().json(json!({ "category": category })))
}

#[instrument(name = "handler::edit_category", skip(app_state, principal, path, form), fields(category_id = %path.as_ref()))]
pub async fn edit_category_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
  path: web::Path<i64>,
  form: web::Form<CategoryInput>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  let id = path.into_inner();
  let form = validated(form.into_inner())?;
  if app_state.repos.categories.update(id, &form.name).await?.is_some() {
    return Ok(see_other("/categories"));
  }
  if app_state.repos.categories.find(id).await?.is_some() {
    return Err(AppError::WriteConflict("Category was changed by someone else.".to_string()));
  }
  Err(AppError::not_found("Category"))
}

#[instrument(name = "handler::confirm_delete_category", skip(app_state, principal, path), fields(category_id = %path.as_ref()))]
pub async fn confirm_delete_category_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
  path: web::Path<i64>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  let category = app_state
    .repos
    .categories
    .find(path.into_inner())
    .await?
    .ok_or_else(|| AppError::not_found("Category"))?;
  Ok(HttpResponse::Ok().json(json!({ "category": category })))
}

#[instrument(name = "handler::delete_category", skip(app_state, principal, path), fields(category_id = %path.as_ref()))]
pub async fn delete_category_handler(
  app_state: web::Data<AppState>,
  principal: Option<Principal>,
  path: web::Path<i64>,
) -> Result<HttpResponse> {
  authorize(principal.as_ref(), Requirement::Administrator)?;
  if !app_state.repos.categories.delete(path.into_inner()).await? {
    info!("Category already gone.");
  }
  Ok(see_other("/categories"))
}
