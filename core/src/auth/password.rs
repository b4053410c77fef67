// storefront-core/src/auth/password.rs

use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use tracing::{debug, error, instrument};

use crate::error::{ShopError, ShopResult};

/// Hashes a plain-text password with Argon2id and a fresh random salt.
#[instrument(name = "auth::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> ShopResult<String> {
  if password.is_empty() {
    return Err(ShopError::validation("password: This field may not be blank."));
  }
  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(hash) => Ok(hash.to_string()),
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(ShopError::internal(format!("password hashing failed: {}", argon_err)))
    }
  }
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unusable.
#[instrument(name = "auth::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> ShopResult<bool> {
  let parsed = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Stored password hash is malformed.");
    ShopError::internal(format!("invalid stored password hash: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password mismatch.");
      Ok(false)
    }
    Err(other) => Err(ShopError::internal(format!("password verification failed: {}", other))),
  }
}
