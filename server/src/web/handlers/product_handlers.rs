// storefront/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use storefront_core::catalog;
use storefront_core::models::{NewProduct, ProductPatch};
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_products", skip_all, fields(user_id = auth.id()))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let products = catalog::list_products(app_state.store.as_ref(), auth.id()).await?;
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::create_product", skip_all, fields(user_id = auth.id()))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
  let product = catalog::create_product(app_state.store.as_ref(), auth.id(), payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::get_product", skip(app_state, auth), fields(user_id = auth.id()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let product = catalog::owned_product(app_state.store.as_ref(), auth.id(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

/// PUT: every writable field is required.
#[instrument(name = "handler::replace_product", skip(app_state, auth, payload), fields(user_id = auth.id()))]
pub async fn replace_product_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
  let patch = ProductPatch::from(payload.into_inner());
  let product = catalog::update_product(app_state.store.as_ref(), auth.id(), path.into_inner(), patch).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::patch_product", skip(app_state, auth, payload), fields(user_id = auth.id()))]
pub async fn patch_product_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let product =
    catalog::update_product(app_state.store.as_ref(), auth.id(), path.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::delete_product", skip(app_state, auth), fields(user_id = auth.id()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  catalog::delete_product(app_state.store.as_ref(), auth.id(), path.into_inner()).await?;
  Ok(HttpResponse::NoContent().finish())
}
