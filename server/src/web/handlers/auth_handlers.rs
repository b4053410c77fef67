// storefront/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront_core::models::Registration;
use storefront_core::workflow::{login, logout, register};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
  #[serde(default)]
  pub username: Option<String>,
  #[serde(default)]
  pub password: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LogoutPayload {
  #[serde(default)]
  pub refresh_token: Option<String>,
}

#[instrument(name = "handler::register", skip(app_state, payload), fields(username = %payload.username))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<Registration>,
) -> Result<HttpResponse, AppError> {
  let user = register(&app_state.workflows, app_state.store.clone(), payload.into_inner()).await?;
  info!(user_id = user.id, "User registered.");
  Ok(HttpResponse::Created().json(user))
}

#[instrument(name = "handler::login", skip_all, fields(username = ?payload.username))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  let LoginPayload { username, password } = payload.into_inner();
  let pair = login(
    &app_state.workflows,
    app_state.store.clone(),
    app_state.tokens.clone(),
    username,
    password,
  )
  .await?;
  Ok(HttpResponse::Ok().json(pair))
}

#[instrument(name = "handler::logout", skip_all, fields(user_id = auth.id()))]
pub async fn logout_handler(
  app_state: web::Data<AppState>,
  auth: AuthenticatedUser,
  payload: web::Json<LogoutPayload>,
) -> Result<HttpResponse, AppError> {
  logout(
    app_state.store.as_ref(),
    &app_state.tokens,
    auth.id(),
    payload.refresh_token.as_deref(),
  )
  .await?;
  Ok(HttpResponse::Ok().json(json!({ "detail": "Logout successful" })))
}
