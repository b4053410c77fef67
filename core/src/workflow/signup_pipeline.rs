// storefront-core/src/workflow/signup_pipeline.rs

use tracing::{event, info, warn, Level};

use super::contexts::SignupCtxData;
use crate::auth::hash_password;
use crate::error::ShopError;
use crate::models::NewUser;
use crate::pipeline::{ContextData, Pipeline, PipelineControl};
use crate::registry::Workflows;

pub const USERNAME_TAKEN: &str = "username: A user with that username already exists.";

pub fn signup_pipeline() -> Pipeline<SignupCtxData> {
  let mut p = Pipeline::<SignupCtxData>::new(
    "signup",
    &[
      ("validate_registration", false, None),
      ("check_username_available", false, None),
      ("create_user", false, None),
    ],
  );

  p.on("validate_registration", |ctx: ContextData<SignupCtxData>| async move {
    let registration = ctx.read().registration.clone();
    event!(Level::DEBUG, username = %registration.username, "Validating registration.");
    registration.validate()?;
    Ok(PipelineControl::Continue)
  });

  p.on("check_username_available", |ctx: ContextData<SignupCtxData>| async move {
    let (store, username) = {
      let guard = ctx.read();
      (guard.store.clone(), guard.registration.username.trim().to_string())
    };
    if store.user_by_username(&username).await?.is_some() {
      warn!(%username, "Registration with a taken username.");
      return Err(ShopError::Conflict(USERNAME_TAKEN.to_string()));
    }
    Ok(PipelineControl::Continue)
  });

  // The insert still fails with `Conflict` if a concurrent sign-up wins the name.
  p.on("create_user", |ctx: ContextData<SignupCtxData>| async move {
    let (store, registration) = {
      let guard = ctx.read();
      (guard.store.clone(), guard.registration.clone())
    };
    let password_hash = hash_password(&registration.password)?;
    let user = store
      .insert_user(NewUser {
        username: registration.username.trim().to_string(),
        password_hash,
        email: registration.email.filter(|e| !e.is_empty()),
        first_name: registration.first_name,
        last_name: registration.last_name,
      })
      .await?;
    info!(user_id = user.id, username = %user.username, "User registered.");
    ctx.write().created_user = Some(user);
    Ok::<_, ShopError>(PipelineControl::Continue)
  });

  p
}

pub fn register_signup_pipeline(workflows: &Workflows) {
  workflows.register(signup_pipeline());
}

