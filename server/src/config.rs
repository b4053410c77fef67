// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

const DEV_JWT_SECRET: &str = "storefront-development-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// `None` runs the server on the in-memory store.
  pub database_url: Option<String>,
  pub db_max_connections: u32,
  pub run_migrations: bool,
  pub jwt_secret: String,
  pub access_token_ttl_secs: i64,
  pub refresh_token_ttl_secs: i64,
  pub log_format: LogFormat,
}

// Keeps the database URL and signing secret out of logs.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("db_max_connections", &self.db_max_connections)
      .field("run_migrations", &self.run_migrations)
      .field("access_token_ttl_secs", &self.access_token_ttl_secs)
      .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
      .field("log_format", &self.log_format)
      .finish_non_exhaustive()
  }
}

fn parsed<T>(name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match env::var(name) {
    Ok(raw) if !raw.trim().is_empty() => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
    _ => Ok(default),
  }
}

fn positive(name: &str, value: i64) -> Result<i64> {
  if value <= 0 {
    return Err(AppError::Config(format!("{} must be positive, got {}", name, value)));
  }
  Ok(value)
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup()
  }

  fn from_lookup() -> Result<Self> {
    let optional = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

    let server_host = optional("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parsed::<u16>("SERVER_PORT", 8080)?;
    let database_url = optional("DATABASE_URL");
    let db_max_connections = parsed::<u32>("DB_MAX_CONNECTIONS", 10)?;
    let run_migrations = parsed::<bool>("RUN_MIGRATIONS", true)?;

    let development = optional("APP_ENV").is_some_and(|v| v == "development");
    let jwt_secret = match optional("JWT_SECRET") {
      Some(secret) => secret,
      None if development => {
        tracing::warn!("JWT_SECRET not set; using the development secret.");
        DEV_JWT_SECRET.to_string()
      }
      None => {
        return Err(AppError::Config(
          "Missing environment variable 'JWT_SECRET'".to_string(),
        ))
      }
    };

    let access_token_ttl_secs = positive("ACCESS_TOKEN_TTL_SECS", parsed("ACCESS_TOKEN_TTL_SECS", 300)?)?;
    let refresh_token_ttl_secs = positive("REFRESH_TOKEN_TTL_SECS", parsed("REFRESH_TOKEN_TTL_SECS", 86_400)?)?;

    let log_format = match optional("LOG_FORMAT").as_deref() {
      None | Some("text") => LogFormat::Text,
      Some("json") => LogFormat::Json,
      Some(other) => return Err(AppError::Config(format!("Invalid LOG_FORMAT: {}", other))),
    };

    Ok(Self {
      server_host,
      server_port,
      database_url,
      db_max_connections,
      run_migrations,
      jwt_secret,
      access_token_ttl_secs,
      refresh_token_ttl_secs,
      log_format,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
