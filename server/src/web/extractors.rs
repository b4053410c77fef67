// storefront/src/web/extractors.rs

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use storefront_core::models::User;
use storefront_core::workflow::authenticate;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// The caller, resolved from `Authorization: Bearer <access token>`.
#[derive(Debug)]
pub struct AuthenticatedUser {
  pub user: User,
}

impl AuthenticatedUser {
  pub fn id(&self) -> i64 {
    self.user.id
  }
}

fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
  let value = req
    .headers()
    .get(header::AUTHORIZATION)
    .ok_or_else(|| AppError::Unauthorized("Authentication credentials were not provided.".to_string()))?;
  let value = value
    .to_str()
    .map_err(|_| AppError::Unauthorized("Invalid Authorization header.".to_string()))?;
  match value.split_once(' ') {
    Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
      Ok(token.trim().to_string())
    }
    _ => Err(AppError::Unauthorized(
      "Authorization header must contain two space-delimited values".to_string(),
    )),
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let token = bearer_token(req);
    let state = req.app_data::<web::Data<AppState>>().cloned();
    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Config("AppState is not registered".to_string()))?;
      let token = token?;
      let user = authenticate(state.store.as_ref(), &state.tokens, &token)
        .await
        .map_err(|e| {
          warn!(error = %e, "Bearer authentication failed.");
          e
        })?;
      Ok(AuthenticatedUser { user })
    })
  }
}
