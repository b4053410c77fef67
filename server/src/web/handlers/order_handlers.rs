// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use storefront_core::models::OrderPayload;
use storefront_core::workflow::{delete_order, get_order, list_orders, save_order};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_orders", skip_all, fields(user_id = auth.id()))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = list_orders(app_state.store.as_ref(), auth.id()).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::create_order", skip_all, fields(user_id = auth.id()))]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<OrderPayload>,
) -> Result<HttpResponse, AppError> {
  let order = save_order(
    &app_state.workflows,
    app_state.store.clone(),
    auth.id(),
    None,
    payload.into_inner(),
  )
  .await?;
  info!(order_id = order.order.id, total = %order.order.total_price, "Order created.");
  Ok(HttpResponse::Created().json(order))
}

#[instrument(name = "handler::get_order", skip(app_state, auth), fields(user_id = auth.id()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let order = get_order(app_state.store.as_ref(), auth.id(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(order))
}

/// Serves both PUT and PATCH: absent `order_items` leaves the items alone.
#[instrument(name = "handler::update_order", skip(app_state, auth, payload), fields(user_id = auth.id()))]
pub async fn update_order_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<OrderPayload>,
) -> Result<HttpResponse, AppError> {
  let order = save_order(
    &app_state.workflows,
    app_state.store.clone(),
    auth.id(),
    Some(path.into_inner()),
    payload.into_inner(),
  )
  .await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::delete_order", skip(app_state, auth), fields(user_id = auth.id()))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  delete_order(app_state.store.as_ref(), auth.id(), path.into_inner()).await?;
  Ok(HttpResponse::NoContent().finish())
}
