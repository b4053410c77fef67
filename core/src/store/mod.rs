// storefront-core/src/store/mod.rs

//! Persistence seam. `Store` covers single-statement reads and writes;
//! `StoreTx` is one open transaction for the order workflow, where every
//! product row it touches stays locked until commit or rollback.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ShopResult;
use crate::models::{
  LineRequest, NewCategory, NewOrder, NewProduct, NewReview, NewUser, Order, OrderDetail, OrderItem, Product,
  ProductCategory, ProductPatch, ProductReview, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
  /// Opens a transaction. Dropping the returned handle without `commit` discards its writes.
  async fn begin(&self) -> ShopResult<Box<dyn StoreTx>>;

  // --- Users ---

  /// Fails with `Conflict` when the username is taken.
  async fn insert_user(&self, user: NewUser) -> ShopResult<User>;
  async fn user_by_username(&self, username: &str) -> ShopResult<Option<User>>;
  async fn user_by_id(&self, id: i64) -> ShopResult<Option<User>>;

  // --- Refresh-token blacklist ---

  /// Returns `false` when the token was already revoked.
  async fn revoke_token(&self, jti: Uuid, user_id: i64, expires_at: DateTime<Utc>) -> ShopResult<bool>;
  async fn is_token_revoked(&self, jti: Uuid) -> ShopResult<bool>;

  // --- Categories ---

  /// Fails with `Validation` when the parent does not exist.
  async fn insert_category(&self, actor: i64, category: NewCategory) -> ShopResult<ProductCategory>;
  async fn categories(&self) -> ShopResult<Vec<ProductCategory>>;
  async fn category(&self, id: i64) -> ShopResult<Option<ProductCategory>>;

  // --- Products ---

  /// Fails with `Validation` when a referenced category does not exist.
  async fn insert_product(&self, actor: i64, product: NewProduct) -> ShopResult<Product>;
  /// Newest first.
  async fn products_by_owner(&self, owner: i64) -> ShopResult<Vec<Product>>;
  async fn product(&self, id: i64) -> ShopResult<Option<Product>>;
  /// Applies `patch` to the current row while holding it locked, so a stock
  /// change committed by an order in the meantime is never overwritten.
  async fn update_product(&self, actor: i64, product_id: i64, patch: ProductPatch) -> ShopResult<Product>;
  async fn delete_product(&self, id: i64) -> ShopResult<bool>;

  // --- Reviews ---

  async fn insert_review(&self, actor: i64, product_id: i64, review: NewReview) -> ShopResult<ProductReview>;
  /// Newest first.
  async fn reviews_for_product(&self, product_id: i64) -> ShopResult<Vec<ProductReview>>;
  async fn review(&self, product_id: i64, review_id: i64) -> ShopResult<Option<ProductReview>>;
  async fn update_review(&self, actor: i64, review: &ProductReview) -> ShopResult<ProductReview>;
  async fn delete_review(&self, review_id: i64) -> ShopResult<bool>;

  // --- Orders (read side and plain delete) ---

  /// Newest first.
  async fn orders_for_user(&self, user_id: i64) -> ShopResult<Vec<OrderDetail>>;
  async fn order_for_user(&self, order_id: i64, user_id: i64) -> ShopResult<Option<OrderDetail>>;
  /// Removes the order and its items. Stock is not restored.
  async fn delete_order(&self, order_id: i64, user_id: i64) -> ShopResult<bool>;
}

/// One open store transaction, used by the order workflow.
#[async_trait]
pub trait StoreTx: Send {
  /// Loads the caller's order and locks its row.
  async fn lock_order(&mut self, order_id: i64, user_id: i64) -> ShopResult<Option<Order>>;
  /// Loads and locks the given products in ascending id order. Unknown ids are left out.
  async fn lock_products(&mut self, ids: &[i64]) -> ShopResult<Vec<Product>>;
  async fn set_stock(&mut self, actor: i64, product_id: i64, stock_quantity: i32) -> ShopResult<()>;

  async fn insert_order(&mut self, actor: i64, order: NewOrder) -> ShopResult<Order>;
  /// Writes user, status and total of an existing order.
  async fn update_order(&mut self, actor: i64, order: &Order) -> ShopResult<Order>;

  async fn order_items(&mut self, order_id: i64) -> ShopResult<Vec<OrderItem>>;
  async fn delete_order_items(&mut self, order_id: i64) -> ShopResult<u64>;
  async fn insert_order_items(&mut self, actor: i64, order_id: i64, lines: &[LineRequest])
    -> ShopResult<Vec<OrderItem>>;

  /// The order aggregate as this transaction sees it.
  async fn order_detail(&mut self, order_id: i64) -> ShopResult<Option<OrderDetail>>;

  async fn commit(self: Box<Self>) -> ShopResult<()>;
  async fn rollback(self: Box<Self>) -> ShopResult<()>;
}
