// storefront-core/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{ShopError, ShopResult};

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 150;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
  pub id: i64,
  pub username: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub email: Option<String>,
  pub first_name: String,
  pub last_name: String,
  pub date_joined: DateTime<Utc>,
}

impl User {
  pub fn name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

/// Registration payload as received from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
  pub username: String,
  pub password: String,
  #[serde(default)]
  pub email: Option<String>,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name: String,
}

impl Registration {
  pub fn validate(&self) -> ShopResult<()> {
    let username = self.username.trim();
    if username.is_empty() {
      return Err(ShopError::validation("username: This field may not be blank."));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
      return Err(ShopError::validation(format!(
        "username: Ensure this field has no more than {} characters.",
        MAX_USERNAME_LEN
      )));
    }
    if !username
      .chars()
      .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
      return Err(ShopError::validation(
        "username: Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
      ));
    }
    if self.password.chars().count() < MIN_PASSWORD_LEN {
      return Err(ShopError::validation(format!(
        "password: Ensure this field has at least {} characters.",
        MIN_PASSWORD_LEN
      )));
    }
    if let Some(email) = self.email.as_deref().filter(|e| !e.is_empty()) {
      if !email.contains('@') {
        return Err(ShopError::validation("email: Enter a valid email address."));
      }
    }
    Ok(())
  }
}

/// A user row ready to be inserted; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username: String,
  pub password_hash: String,
  pub email: Option<String>,
  pub first_name: String,
  pub last_name: String,
}
