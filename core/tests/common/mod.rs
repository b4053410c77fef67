// tests/common/mod.rs
#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use storefront_core::models::{LineRequest, NewProduct, NewUser, OrderPayload, OrderStatus, Product, User};
use storefront_core::{standard_workflows, ContextData, MemoryStore, PipelineControl, ShopError, ShopResult, Store, Workflows};
use tracing::Level;

// --- Tracing ---

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Engine test context ---

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
  pub flag: bool,
}

pub fn record_step(
  step_name: &'static str,
) -> impl Fn(ContextData<TestContext>) -> std::future::Ready<ShopResult<PipelineControl>> + Send + Sync + 'static {
  move |ctx: ContextData<TestContext>| {
    let mut guard = ctx.write();
    guard.counter += 1;
    guard.steps_executed.push(step_name.to_string());
    let control = match &guard.should_stop_at {
      Some(stop_at) if stop_at == step_name => PipelineControl::Stop,
      _ => PipelineControl::Continue,
    };
    std::future::ready(Ok(control))
  }
}

pub fn failing_step(
  step_name: &'static str,
) -> impl Fn(ContextData<TestContext>) -> std::future::Ready<ShopResult<PipelineControl>> + Send + Sync + 'static {
  move |ctx: ContextData<TestContext>| {
    ctx.write().steps_executed.push(step_name.to_string());
    std::future::ready(Err(ShopError::validation(format!("{} failed", step_name))))
  }
}

// --- Store fixtures ---

pub struct Shop {
  pub store: Arc<dyn Store>,
  pub workflows: Workflows,
}

impl Shop {
  pub fn new() -> Self {
    setup_tracing();
    Self {
      store: Arc::new(MemoryStore::new()),
      workflows: standard_workflows(),
    }
  }

  pub fn with_store(store: Arc<dyn Store>) -> Self {
    setup_tracing();
    Self {
      store,
      workflows: standard_workflows(),
    }
  }

  pub async fn user(&self, username: &str) -> User {
    self
      .store
      .insert_user(NewUser {
        username: username.to_string(),
        password_hash: "unused".to_string(),
        email: None,
        first_name: String::new(),
        last_name: String::new(),
      })
      .await
      .unwrap()
  }

  pub async fn product(&self, owner: &User, name: &str, price: &str, stock: i32) -> Product {
    self
      .store
      .insert_product(
        owner.id,
        NewProduct {
          name: name.to_string(),
          description: String::new(),
          price: dec(price),
          stock_quantity: stock,
          categories: Vec::new(),
        }
        .normalized()
        .unwrap(),
      )
      .await
      .unwrap()
  }

  pub async fn stock_of(&self, product: &Product) -> i32 {
    self.store.product(product.id).await.unwrap().unwrap().stock_quantity
  }
}

pub fn dec(value: &str) -> Decimal {
  Decimal::from_str(value).unwrap()
}

pub fn items(lines: &[(i64, i32)]) -> OrderPayload {
  OrderPayload {
    order_items: Some(lines.iter().map(|(p, q)| LineRequest::new(*p, *q)).collect()),
    order_status: None,
  }
}

pub fn status_only(status: OrderStatus) -> OrderPayload {
  OrderPayload {
    order_items: None,
    order_status: Some(status),
  }
}
