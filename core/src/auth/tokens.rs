// storefront-core/src/auth/tokens.rs

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{ShopError, ShopResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
  Access,
  Refresh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
  /// User id.
  pub sub: i64,
  pub token_type: TokenType,
  pub jti: Uuid,
  pub iat: i64,
  pub exp: i64,
}

impl Claims {
  pub fn expires_at(&self) -> DateTime<Utc> {
    Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
  }
}

/// Body of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
  pub refresh: String,
  pub access: String,
}

/// Issues and validates HS256 tokens signed with one shared secret.
#[derive(Clone)]
pub struct TokenService {
  encoding: EncodingKey,
  decoding: DecodingKey,
  access_ttl: Duration,
  refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TokenService")
      .field("access_ttl", &self.access_ttl)
      .field("refresh_ttl", &self.refresh_ttl)
      .finish_non_exhaustive()
  }
}

impl TokenService {
  pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      access_ttl,
      refresh_ttl,
    }
  }

  fn issue(&self, user_id: i64, token_type: TokenType, now: DateTime<Utc>) -> ShopResult<String> {
    let ttl = match token_type {
      TokenType::Access => self.access_ttl,
      TokenType::Refresh => self.refresh_ttl,
    };
    let claims = Claims {
      sub: user_id,
      token_type,
      jti: Uuid::new_v4(),
      iat: now.timestamp(),
      exp: (now + ttl).timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(|e| ShopError::internal(format!("token encoding failed: {}", e)))
  }

  #[instrument(name = "TokenService::issue_pair", skip(self))]
  pub fn issue_pair(&self, user_id: i64) -> ShopResult<TokenPair> {
    let now = Utc::now();
    Ok(TokenPair {
      refresh: self.issue(user_id, TokenType::Refresh, now)?,
      access: self.issue(user_id, TokenType::Access, now)?,
    })
  }

  /// Checks signature, expiry and token type.
  pub fn decode(&self, token: &str, expected: TokenType) -> ShopResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
      debug!(error = %e, "Token rejected.");
      ShopError::AuthToken("Given token not valid for any token type".to_string())
    })?;
    if data.claims.token_type != expected {
      return Err(ShopError::AuthToken("Token has wrong type".to_string()));
    }
    Ok(data.claims)
  }
}
