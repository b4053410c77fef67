// storefront-core/src/store/memory.rs

//! In-process backend for tests, benchmarks and database-less runs.
//!
//! A transaction holds the store's async mutex for its whole life and works
//! on a staged copy of the state; commit swaps the copy in. Transactions are
//! therefore fully serialised, which closes the check-then-decrement race on
//! stock the same way row locks do in PostgreSQL.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Store, StoreTx};
use crate::error::{ShopError, ShopResult};
use crate::models::{
  Audit, LineRequest, NewCategory, NewOrder, NewProduct, NewReview, NewUser, Order, OrderDetail, OrderItem,
  OrderItemDetail, Product, ProductCategory, ProductPatch, ProductReview, User,
};

#[derive(Debug, Clone, Default)]
struct Sequences {
  users: i64,
  categories: i64,
  products: i64,
  reviews: i64,
  orders: i64,
  order_items: i64,
}

fn next(seq: &mut i64) -> i64 {
  *seq += 1;
  *seq
}

#[derive(Debug, Clone, Default)]
struct MemState {
  seq: Sequences,
  users: BTreeMap<i64, User>,
  /// Revoked refresh-token ids and their expiry.
  revoked: HashMap<Uuid, DateTime<Utc>>,
  categories: BTreeMap<i64, ProductCategory>,
  products: BTreeMap<i64, Product>,
  reviews: BTreeMap<i64, ProductReview>,
  orders: BTreeMap<i64, Order>,
  order_items: BTreeMap<i64, OrderItem>,
}

impl MemState {
  fn ensure_categories_exist(&self, ids: &[i64]) -> ShopResult<()> {
    match ids.iter().find(|id| !self.categories.contains_key(*id)) {
      Some(missing) => Err(ShopError::validation(format!(
        "categories: Invalid pk \"{}\" - object does not exist.",
        missing
      ))),
      None => Ok(()),
    }
  }

  fn detail(&self, order: &Order) -> ShopResult<OrderDetail> {
    let order_items = self
      .order_items
      .values()
      .filter(|item| item.order_id == order.id)
      .map(|item| {
        let product = self
          .products
          .get(&item.product_id)
          .cloned()
          .ok_or_else(|| ShopError::internal(format!("order item {} references missing product", item.id)))?;
        Ok(OrderItemDetail::new(item.clone(), product))
      })
      .collect::<ShopResult<Vec<_>>>()?;
    Ok(OrderDetail {
      order: order.clone(),
      order_items,
    })
  }

  fn remove_order(&mut self, order_id: i64) {
    self.orders.remove(&order_id);
    self.order_items.retain(|_, item| item.order_id != order_id);
  }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<MemState>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn begin(&self) -> ShopResult<Box<dyn StoreTx>> {
    let guard = Arc::clone(&self.state).lock_owned().await;
    let staged = guard.clone();
    Ok(Box::new(MemTx { guard, staged }))
  }

  async fn insert_user(&self, user: NewUser) -> ShopResult<User> {
    let mut state = self.state.lock().await;
    if state.users.values().any(|u| u.username == user.username) {
      return Err(ShopError::Conflict(
        "username: A user with that username already exists.".to_string(),
      ));
    }
    let id = next(&mut state.seq.users);
    let created = User {
      id,
      username: user.username,
      password_hash: user.password_hash,
      email: user.email,
      first_name: user.first_name,
      last_name: user.last_name,
      date_joined: Utc::now(),
    };
    state.users.insert(id, created.clone());
    Ok(created)
  }

  async fn user_by_username(&self, username: &str) -> ShopResult<Option<User>> {
    let state = self.state.lock().await;
    Ok(state.users.values().find(|u| u.username == username).cloned())
  }

  async fn user_by_id(&self, id: i64) -> ShopResult<Option<User>> {
    Ok(self.state.lock().await.users.get(&id).cloned())
  }

  async fn revoke_token(&self, jti: Uuid, _user_id: i64, expires_at: DateTime<Utc>) -> ShopResult<bool> {
    let mut state = self.state.lock().await;
    if state.revoked.contains_key(&jti) {
      return Ok(false);
    }
    // Expired tokens fail signature validation anyway; no need to remember them.
    let now = Utc::now();
    state.revoked.retain(|_, expiry| *expiry > now);
    state.revoked.insert(jti, expires_at);
    Ok(true)
  }

  async fn is_token_revoked(&self, jti: Uuid) -> ShopResult<bool> {
    Ok(self.state.lock().await.revoked.contains_key(&jti))
  }

  async fn insert_category(&self, actor: i64, category: NewCategory) -> ShopResult<ProductCategory> {
    let mut state = self.state.lock().await;
    if let Some(parent_id) = category.parent_id {
      if !state.categories.contains_key(&parent_id) {
        return Err(ShopError::validation(format!(
          "parent: Invalid pk \"{}\" - object does not exist.",
          parent_id
        )));
      }
    }
    let id = next(&mut state.seq.categories);
    let created = ProductCategory {
      id,
      parent_id: category.parent_id,
      name: category.name,
      description: category.description,
      audit: Audit::created_by(actor),
    };
    state.categories.insert(id, created.clone());
    Ok(created)
  }

  async fn categories(&self) -> ShopResult<Vec<ProductCategory>> {
    Ok(self.state.lock().await.categories.values().cloned().collect())
  }

  async fn category(&self, id: i64) -> ShopResult<Option<ProductCategory>> {
    Ok(self.state.lock().await.categories.get(&id).cloned())
  }

  async fn insert_product(&self, actor: i64, product: NewProduct) -> ShopResult<Product> {
    let mut state = self.state.lock().await;
    state.ensure_categories_exist(&product.categories)?;
    let id = next(&mut state.seq.products);
    let created = Product {
      id,
      name: product.name,
      description: product.description,
      price: product.price,
      stock_quantity: product.stock_quantity,
      categories: product.categories,
      audit: Audit::created_by(actor),
    };
    state.products.insert(id, created.clone());
    Ok(created)
  }

  async fn products_by_owner(&self, owner: i64) -> ShopResult<Vec<Product>> {
    let state = self.state.lock().await;
    Ok(
      state
        .products
        .values()
        .rev()
        .filter(|p| p.owner() == Some(owner))
        .cloned()
        .collect(),
    )
  }

  async fn product(&self, id: i64) -> ShopResult<Option<Product>> {
    Ok(self.state.lock().await.products.get(&id).cloned())
  }

  async fn update_product(&self, actor: i64, product_id: i64, patch: ProductPatch) -> ShopResult<Product> {
    let mut state = self.state.lock().await;
    if let Some(categories) = &patch.categories {
      state.ensure_categories_exist(categories)?;
    }
    let stored = state
      .products
      .get_mut(&product_id)
      .ok_or_else(|| ShopError::not_found("No Product matches the given query."))?;
    stored.apply(patch);
    stored.audit.touch(actor);
    Ok(stored.clone())
  }

  async fn delete_product(&self, id: i64) -> ShopResult<bool> {
    let mut state = self.state.lock().await;
    if state.products.remove(&id).is_none() {
      return Ok(false);
    }
    state.reviews.retain(|_, r| r.product_id != id);
    state.order_items.retain(|_, item| item.product_id != id);
    Ok(true)
  }

  async fn insert_review(&self, actor: i64, product_id: i64, review: NewReview) -> ShopResult<ProductReview> {
    let mut state = self.state.lock().await;
    if !state.products.contains_key(&product_id) {
      return Err(ShopError::not_found("No Product matches the given query."));
    }
    let id = next(&mut state.seq.reviews);
    let created = ProductReview {
      id,
      product_id,
      user_id: actor,
      text: review.text,
      rating: review.rating,
      audit: Audit::created_by(actor),
    };
    state.reviews.insert(id, created.clone());
    Ok(created)
  }

  async fn reviews_for_product(&self, product_id: i64) -> ShopResult<Vec<ProductReview>> {
    let state = self.state.lock().await;
    Ok(
      state
        .reviews
        .values()
        .rev()
        .filter(|r| r.product_id == product_id)
        .cloned()
        .collect(),
    )
  }

  async fn review(&self, product_id: i64, review_id: i64) -> ShopResult<Option<ProductReview>> {
    let state = self.state.lock().await;
    Ok(state.reviews.get(&review_id).filter(|r| r.product_id == product_id).cloned())
  }

  async fn update_review(&self, actor: i64, review: &ProductReview) -> ShopResult<ProductReview> {
    let mut state = self.state.lock().await;
    let stored = state
      .reviews
      .get_mut(&review.id)
      .ok_or_else(|| ShopError::not_found("No ProductReview matches the given query."))?;
    stored.text = review.text.clone();
    stored.rating = review.rating;
    stored.audit.touch(actor);
    Ok(stored.clone())
  }

  async fn delete_review(&self, review_id: i64) -> ShopResult<bool> {
    Ok(self.state.lock().await.reviews.remove(&review_id).is_some())
  }

  async fn orders_for_user(&self, user_id: i64) -> ShopResult<Vec<OrderDetail>> {
    let state = self.state.lock().await;
    state
      .orders
      .values()
      .rev()
      .filter(|o| o.user_id == user_id)
      .map(|o| state.detail(o))
      .collect()
  }

  async fn order_for_user(&self, order_id: i64, user_id: i64) -> ShopResult<Option<OrderDetail>> {
    let state = self.state.lock().await;
    state
      .orders
      .get(&order_id)
      .filter(|o| o.user_id == user_id)
      .map(|o| state.detail(o))
      .transpose()
  }

  async fn delete_order(&self, order_id: i64, user_id: i64) -> ShopResult<bool> {
    let mut state = self.state.lock().await;
    if !state.orders.get(&order_id).is_some_and(|o| o.user_id == user_id) {
      return Ok(false);
    }
    state.remove_order(order_id);
    Ok(true)
  }
}

/// Holds the store lock until committed or dropped.
pub struct MemTx {
  guard: OwnedMutexGuard<MemState>,
  staged: MemState,
}

#[async_trait]
impl StoreTx for MemTx {
  async fn lock_order(&mut self, order_id: i64, user_id: i64) -> ShopResult<Option<Order>> {
    Ok(self.staged.orders.get(&order_id).filter(|o| o.user_id == user_id).cloned())
  }

  async fn lock_products(&mut self, ids: &[i64]) -> ShopResult<Vec<Product>> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids.iter().filter_map(|id| self.staged.products.get(id).cloned()).collect())
  }

  async fn set_stock(&mut self, actor: i64, product_id: i64, stock_quantity: i32) -> ShopResult<()> {
    if stock_quantity < 0 {
      return Err(ShopError::internal(format!(
        "stock_quantity of product {} would become negative",
        product_id
      )));
    }
    let product = self
      .staged
      .products
      .get_mut(&product_id)
      .ok_or_else(|| ShopError::not_found("No Product matches the given query."))?;
    product.stock_quantity = stock_quantity;
    product.audit.touch(actor);
    Ok(())
  }

  async fn insert_order(&mut self, actor: i64, order: NewOrder) -> ShopResult<Order> {
    let id = next(&mut self.staged.seq.orders);
    let created = Order {
      id,
      user_id: order.user_id,
      total_price: order.total_price,
      order_status: order.order_status,
      audit: Audit::created_by(actor),
    };
    self.staged.orders.insert(id, created.clone());
    Ok(created)
  }

  async fn update_order(&mut self, actor: i64, order: &Order) -> ShopResult<Order> {
    let stored = self
      .staged
      .orders
      .get_mut(&order.id)
      .ok_or_else(|| ShopError::not_found("No Order matches the given query."))?;
    stored.user_id = order.user_id;
    stored.total_price = order.total_price;
    stored.order_status = order.order_status;
    stored.audit.touch(actor);
    Ok(stored.clone())
  }

  async fn order_items(&mut self, order_id: i64) -> ShopResult<Vec<OrderItem>> {
    Ok(
      self
        .staged
        .order_items
        .values()
        .filter(|item| item.order_id == order_id)
        .cloned()
        .collect(),
    )
  }

  async fn delete_order_items(&mut self, order_id: i64) -> ShopResult<u64> {
    let before = self.staged.order_items.len();
    self.staged.order_items.retain(|_, item| item.order_id != order_id);
    Ok((before - self.staged.order_items.len()) as u64)
  }

  async fn insert_order_items(
    &mut self,
    actor: i64,
    order_id: i64,
    lines: &[LineRequest],
  ) -> ShopResult<Vec<OrderItem>> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
      if !self.staged.products.contains_key(&line.product) {
        return Err(ShopError::validation(format!(
          "order_items: Invalid pk \"{}\" - object does not exist.",
          line.product
        )));
      }
      let id = next(&mut self.staged.seq.order_items);
      let item = OrderItem {
        id,
        order_id,
        product_id: line.product,
        quantity: line.quantity,
        audit: Audit::created_by(actor),
      };
      self.staged.order_items.insert(id, item.clone());
      items.push(item);
    }
    Ok(items)
  }

  async fn order_detail(&mut self, order_id: i64) -> ShopResult<Option<OrderDetail>> {
    self
      .staged
      .orders
      .get(&order_id)
      .map(|o| self.staged.detail(o))
      .transpose()
  }

  async fn commit(self: Box<Self>) -> ShopResult<()> {
    let MemTx { mut guard, staged } = *self;
    *guard = staged;
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> ShopResult<()> {
    Ok(())
  }
}
