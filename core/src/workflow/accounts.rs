// storefront-core/src/workflow/accounts.rs

//! Account entry points: sign-up and sign-in run as registered pipelines;
//! logout and bearer authentication are direct store calls.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::contexts::{SigninCtxData, SignupCtxData};
use crate::auth::{TokenPair, TokenService, TokenType};
use crate::error::{ShopError, ShopResult};
use crate::models::{Registration, User};
use crate::pipeline::{ContextData, PipelineResult};
use crate::registry::Workflows;
use crate::store::Store;

pub const INVALID_TOKEN: &str = "Invalid token";

fn completed(result: PipelineResult, pipeline: &str) -> ShopResult<()> {
  match result {
    PipelineResult::Completed => Ok(()),
    PipelineResult::Stopped => Err(ShopError::internal(format!("{} pipeline stopped early", pipeline))),
  }
}

#[instrument(name = "accounts::register", skip(workflows, store, registration), fields(username = %registration.username))]
pub async fn register(workflows: &Workflows, store: Arc<dyn Store>, registration: Registration) -> ShopResult<User> {
  let ctx = ContextData::new(SignupCtxData {
    store,
    registration,
    created_user: None,
  });
  completed(workflows.run(ctx.clone()).await?, "signup")?;
  let created = ctx.write().created_user.take();
  created.ok_or_else(|| ShopError::internal("signup pipeline produced no user"))
}

#[instrument(name = "accounts::login", skip_all)]
pub async fn login(
  workflows: &Workflows,
  store: Arc<dyn Store>,
  tokens: Arc<TokenService>,
  username: Option<String>,
  password: Option<String>,
) -> ShopResult<TokenPair> {
  let ctx = ContextData::new(SigninCtxData {
    store,
    tokens,
    username,
    password,
    user: None,
    issued: None,
  });
  completed(workflows.run(ctx.clone()).await?, "signin")?;
  let issued = ctx.write().issued.take();
  issued.ok_or_else(|| ShopError::internal("signin pipeline issued no tokens"))
}

/// Blacklists the caller's refresh token.
///
/// Undecodable, expired, foreign or already revoked tokens all fail with
/// `Validation("Invalid token")`.
#[instrument(name = "accounts::logout", skip(store, tokens, refresh_token))]
pub async fn logout(
  store: &dyn Store,
  tokens: &TokenService,
  actor: i64,
  refresh_token: Option<&str>,
) -> ShopResult<()> {
  let refresh_token = refresh_token
    .filter(|t| !t.is_empty())
    .ok_or_else(|| ShopError::validation("Refresh token is required"))?;

  let claims = tokens
    .decode(refresh_token, TokenType::Refresh)
    .map_err(|_| ShopError::validation(INVALID_TOKEN))?;
  if claims.sub != actor {
    warn!(token_owner = claims.sub, "Logout with another user's refresh token.");
    return Err(ShopError::validation(INVALID_TOKEN));
  }
  if store.is_token_revoked(claims.jti).await? {
    return Err(ShopError::validation(INVALID_TOKEN));
  }
  if !store.revoke_token(claims.jti, actor, claims.expires_at()).await? {
    return Err(ShopError::validation(INVALID_TOKEN));
  }
  info!(jti = %claims.jti, "Refresh token revoked.");
  Ok(())
}

/// Resolves a bearer access token to its user.
pub async fn authenticate(store: &dyn Store, tokens: &TokenService, bearer: &str) -> ShopResult<User> {
  let claims = tokens.decode(bearer, TokenType::Access)?;
  store
    .user_by_id(claims.sub)
    .await?
    .ok_or_else(|| ShopError::AuthToken("User not found".to_string()))
}
