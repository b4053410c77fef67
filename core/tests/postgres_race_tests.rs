// tests/postgres_race_tests.rs
//! Runs the order workflow against a real PostgreSQL database.
//!
//! Ignored by default. Point `DATABASE_URL` at a scratch database and run
//! `cargo test -p storefront-core --test postgres_race_tests -- --ignored`.

mod common;

use std::sync::Arc;

use common::*;
use serial_test::serial;
use storefront_core::workflow::save_order;
use storefront_core::{PgStore, ShopError, Store};
use uuid::Uuid;

async fn pg_shop() -> Arc<Shop> {
  let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for PostgreSQL tests");
  let store = PgStore::connect(&url, 8).await.unwrap();
  store.migrate().await.unwrap();
  Arc::new(Shop::with_store(Arc::new(store)))
}

fn unique(prefix: &str) -> String {
  format!("{}-{}", prefix, Uuid::new_v4().simple())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
#[serial]
async fn last_unit_is_sold_once_under_contention() {
  let shop = pg_shop().await;
  let seller = shop.user(&unique("seller")).await;
  let lamp = shop.product(&seller, "Lamp", "5.00", 1).await;

  let mut handles = Vec::new();
  for _ in 0..4 {
    let buyer = shop.user(&unique("buyer")).await;
    let shop = Arc::clone(&shop);
    let lamp_id = lamp.id;
    handles.push(tokio::spawn(async move {
      save_order(&shop.workflows, shop.store.clone(), buyer.id, None, items(&[(lamp_id, 1)])).await
    }));
  }

  let mut successes = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => successes += 1,
      Err(ShopError::StockInsufficient { .. }) => {}
      Err(other) => panic!("unexpected error: {}", other),
    }
  }
  assert_eq!(successes, 1);
  assert_eq!(shop.stock_of(&lamp).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
#[serial]
async fn opposite_line_order_does_not_deadlock() {
  let shop = pg_shop().await;
  let seller = shop.user(&unique("seller")).await;
  let lamp = shop.product(&seller, "Lamp", "5.00", 100).await;
  let desk = shop.product(&seller, "Desk", "50.00", 100).await;
  let buyer = shop.user(&unique("buyer")).await;

  let mut handles = Vec::new();
  for i in 0..10 {
    let shop = Arc::clone(&shop);
    let lines = if i % 2 == 0 {
      vec![(lamp.id, 1), (desk.id, 1)]
    } else {
      vec![(desk.id, 1), (lamp.id, 1)]
    };
    let buyer_id = buyer.id;
    handles.push(tokio::spawn(async move {
      save_order(&shop.workflows, shop.store.clone(), buyer_id, None, items(&lines)).await
    }));
  }
  for handle in handles {
    handle.await.unwrap().unwrap();
  }

  assert_eq!(shop.stock_of(&lamp).await, 90);
  assert_eq!(shop.stock_of(&desk).await, 90);
}

#[tokio::test]
#[ignore]
#[serial]
async fn failed_order_rolls_back_in_postgres() {
  let shop = pg_shop().await;
  let seller = shop.user(&unique("seller")).await;
  let lamp = shop.product(&seller, "Lamp", "5.00", 3).await;
  let desk = shop.product(&seller, "Desk", "50.00", 1).await;

  let err = save_order(
    &shop.workflows,
    shop.store.clone(),
    seller.id,
    None,
    items(&[(lamp.id, 2), (desk.id, 2)]),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, ShopError::StockInsufficient { .. }));
  assert_eq!(shop.stock_of(&lamp).await, 3);
  assert_eq!(shop.stock_of(&desk).await, 1);
  assert!(shop.store.orders_for_user(seller.id).await.unwrap().is_empty());
}
