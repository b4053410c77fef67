// storefront-core/src/workflow/signin_pipeline.rs

use tracing::{event, info, warn, Level};

use super::contexts::SigninCtxData;
use crate::auth::verify_password;
use crate::error::{ShopError, ShopResult};
use crate::pipeline::{ContextData, Pipeline, PipelineControl};
use crate::registry::Workflows;

pub fn signin_pipeline() -> Pipeline<SigninCtxData> {
  let mut p = Pipeline::<SigninCtxData>::new(
    "signin",
    &[
      ("validate_credentials", false, None),
      ("fetch_user", false, None),
      ("verify_password", false, None),
      ("issue_tokens", false, None),
    ],
  );

  p.on("validate_credentials", validate_credentials);
  p.on("fetch_user", fetch_user);
  p.on("verify_password", check_password);
  p.on("issue_tokens", issue_tokens);
  p
}

pub fn register_signin_pipeline(workflows: &Workflows) {
  workflows.register(signin_pipeline());
}

async fn validate_credentials(ctx: ContextData<SigninCtxData>) -> ShopResult<PipelineControl> {
  let guard = ctx.read();
  let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
  if !present(&guard.username) || !present(&guard.password) {
    return Err(ShopError::validation("Both username and password are required"));
  }
  Ok(PipelineControl::Continue)
}

async fn fetch_user(ctx: ContextData<SigninCtxData>) -> ShopResult<PipelineControl> {
  let (store, username) = {
    let guard = ctx.read();
    (guard.store.clone(), guard.username.clone().unwrap_or_default())
  };
  event!(Level::DEBUG, %username, "Fetching user for sign-in.");
  match store.user_by_username(&username).await? {
    Some(user) => {
      ctx.write().user = Some(user);
      Ok(PipelineControl::Continue)
    }
    None => {
      warn!(%username, "Sign-in for unknown user.");
      Err(ShopError::InvalidCredentials)
    }
  }
}

async fn check_password(ctx: ContextData<SigninCtxData>) -> ShopResult<PipelineControl> {
  let (stored_hash, password) = {
    let guard = ctx.read();
    let user = guard
      .user
      .as_ref()
      .ok_or_else(|| ShopError::internal("verify_password ran before fetch_user"))?;
    (user.password_hash.clone(), guard.password.clone().unwrap_or_default())
  };
  if !verify_password(&stored_hash, &password)? {
    warn!("Sign-in with a wrong password.");
    return Err(ShopError::InvalidCredentials);
  }
  Ok(PipelineControl::Continue)
}

async fn issue_tokens(ctx: ContextData<SigninCtxData>) -> ShopResult<PipelineControl> {
  let mut guard = ctx.write();
  let user_id = guard
    .user
    .as_ref()
    .map(|u| u.id)
    .ok_or_else(|| ShopError::internal("issue_tokens ran before fetch_user"))?;
  let issued = guard.tokens.issue_pair(user_id)?;
  guard.issued = Some(issued);
  info!(user_id, "User signed in.");
  Ok(PipelineControl::Continue)
}
