// storefront/src/state.rs
use crate::config::AppConfig;
use crate::errors::Result;
use chrono::Duration;
use std::sync::Arc;
use storefront_core::auth::TokenService;
use storefront_core::{standard_workflows, MemoryStore, PgStore, Store, Workflows};

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub workflows: Arc<Workflows>,
  pub tokens: Arc<TokenService>,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
    let tokens = TokenService::new(
      config.jwt_secret.as_bytes(),
      Duration::seconds(config.access_token_ttl_secs),
      Duration::seconds(config.refresh_token_ttl_secs),
    );
    Self {
      store,
      workflows: Arc::new(standard_workflows()),
      tokens: Arc::new(tokens),
      config: Arc::new(config),
    }
  }

  /// Picks the backend from the config: PostgreSQL when `DATABASE_URL` is set, memory otherwise.
  pub async fn from_config(config: AppConfig) -> Result<Self> {
    let store: Arc<dyn Store> = match &config.database_url {
      Some(url) => {
        let store = PgStore::connect(url, config.db_max_connections).await?;
        if config.run_migrations {
          store.migrate().await?;
        }
        Arc::new(store)
      }
      None => {
        tracing::warn!("DATABASE_URL not set; using the in-memory store. Data is lost on exit.");
        Arc::new(MemoryStore::new())
      }
    };
    Ok(Self::new(store, config))
  }
}
