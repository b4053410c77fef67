// storefront/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use storefront_core::catalog;
use storefront_core::models::{NewReview, ReviewPatch};
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_reviews", skip(app_state, _auth))]
pub async fn list_reviews_handler(
  app_state: web::Data<AppState>,
  _auth: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let reviews = catalog::list_reviews(app_state.store.as_ref(), path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(reviews))
}

#[instrument(name = "handler::create_review", skip(app_state, auth, payload), fields(user_id = auth.id()))]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<i64>,
  payload: web::Json<NewReview>,
) -> Result<HttpResponse, AppError> {
  let review =
    catalog::create_review(app_state.store.as_ref(), auth.id(), path.into_inner(), payload.into_inner()).await?;
  Ok(HttpResponse::Created().json(review))
}

#[instrument(name = "handler::get_review", skip(app_state, _auth))]
pub async fn get_review_handler(
  app_state: web::Data<AppState>,
  _auth: AuthenticatedUser,
  path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
  let (product_id, review_id) = path.into_inner();
  let review = catalog::get_review(app_state.store.as_ref(), product_id, review_id).await?;
  Ok(HttpResponse::Ok().json(review))
}

#[instrument(name = "handler::replace_review", skip(app_state, auth, payload), fields(user_id = auth.id()))]
pub async fn replace_review_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<(i64, i64)>,
  payload: web::Json<NewReview>,
) -> Result<HttpResponse, AppError> {
  let (product_id, review_id) = path.into_inner();
  let patch = ReviewPatch::from(payload.into_inner());
  let review = catalog::update_review(app_state.store.as_ref(), auth.id(), product_id, review_id, patch).await?;
  Ok(HttpResponse::Ok().json(review))
}

#[instrument(name = "handler::patch_review", skip(app_state, auth, payload), fields(user_id = auth.id()))]
pub async fn patch_review_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<(i64, i64)>,
  payload: web::Json<ReviewPatch>,
) -> Result<HttpResponse, AppError> {
  let (product_id, review_id) = path.into_inner();
  let review =
    catalog::update_review(app_state.store.as_ref(), auth.id(), product_id, review_id, payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(review))
}

#[instrument(name = "handler::delete_review", skip(app_state, auth), fields(user_id = auth.id()))]
pub async fn delete_review_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  path: web::Path<(i64, i64)>,
) -> Result<HttpResponse, AppError> {
  let (product_id, review_id) = path.into_inner();
  catalog::delete_review(app_state.store.as_ref(), auth.id(), product_id, review_id).await?;
  Ok(HttpResponse::NoContent().finish())
}
