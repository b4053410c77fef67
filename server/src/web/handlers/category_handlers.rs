// storefront/src/web/handlers/category_handlers.rs

use actix_web::{web, HttpResponse};
use storefront_core::catalog;
use storefront_core::models::NewCategory;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

pub async fn list_categories_handler(
  app_state: web::Data<AppState>,
  _auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let categories = catalog::list_categories(app_state.store.as_ref()).await?;
  Ok(HttpResponse::Ok().json(categories))
}

#[instrument(name = "handler::create_category", skip_all, fields(user_id = auth.id()))]
pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<NewCategory>,
) -> Result<HttpResponse, AppError> {
  let category = catalog::create_category(app_state.store.as_ref(), auth.id(), payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(category))
}

pub async fn get_category_handler(
  app_state: web::Data<AppState>,
  _auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let category = catalog::get_category(app_state.store.as_ref(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(category))
}
