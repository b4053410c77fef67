// storefront-core/src/store/postgres.rs

//! PostgreSQL backend. Order transactions take `FOR UPDATE` row locks on the
//! order and on every product they read, products in ascending id order.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::{event, instrument, Level};
use uuid::Uuid;

use super::{Store, StoreTx};
use crate::error::{ShopError, ShopResult};
use crate::models::{
  LineRequest, NewCategory, NewOrder, NewProduct, NewReview, NewUser, Order, OrderDetail, OrderItem, OrderItemDetail,
  Product, ProductCategory, ProductPatch, ProductReview, User,
};

const USER_COLUMNS: &str = "id, username, password_hash, email, first_name, last_name, date_joined";
const CATEGORY_COLUMNS: &str =
  "id, parent_id, name, description, created_at, updated_at, created_by, updated_by";
const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.stock_quantity, \
  ARRAY(SELECT l.category_id FROM product_category_links l WHERE l.product_id = p.id ORDER BY l.category_id) AS categories, \
  p.created_at, p.updated_at, p.created_by, p.updated_by";
const REVIEW_COLUMNS: &str =
  "id, product_id, user_id, text, rating, created_at, updated_at, created_by, updated_by";
const ORDER_COLUMNS: &str =
  "id, user_id, total_price, order_status, created_at, updated_at, created_by, updated_by";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, created_at, updated_at, created_by, updated_by";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  #[instrument(name = "PgStore::connect", skip(database_url))]
  pub async fn connect(database_url: &str, max_connections: u32) -> ShopResult<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    event!(Level::INFO, max_connections, "Database pool established.");
    Ok(Self { pool })
  }

  pub async fn migrate(&self) -> ShopResult<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    event!(Level::INFO, "Database migrations applied.");
    Ok(())
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

fn conflict_on_unique(err: sqlx::Error, message: &str) -> ShopError {
  match &err {
    sqlx::Error::Database(db) if db.is_unique_violation() => ShopError::Conflict(message.to_string()),
    _ => ShopError::Database(err),
  }
}

async fn ensure_categories_exist(conn: &mut PgConnection, ids: &[i64]) -> ShopResult<()> {
  if ids.is_empty() {
    return Ok(());
  }
  let found: Vec<i64> = sqlx::query_scalar("SELECT id FROM product_categories WHERE id = ANY($1)")
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;
  if let Some(missing) = ids.iter().find(|id| !found.contains(*id)) {
    return Err(ShopError::validation(format!(
      "categories: Invalid pk \"{}\" - object does not exist.",
      missing
    )));
  }
  Ok(())
}

async fn replace_category_links(conn: &mut PgConnection, product_id: i64, ids: &[i64]) -> ShopResult<()> {
  sqlx::query("DELETE FROM product_category_links WHERE product_id = $1")
    .bind(product_id)
    .execute(&mut *conn)
    .await?;
  if !ids.is_empty() {
    sqlx::query("INSERT INTO product_category_links (product_id, category_id) SELECT $1, UNNEST($2::BIGINT[])")
      .bind(product_id)
      .bind(ids)
      .execute(&mut *conn)
      .await?;
  }
  Ok(())
}

async fn fetch_product(conn: &mut PgConnection, id: i64) -> ShopResult<Option<Product>> {
  let sql = format!("SELECT {} FROM products p WHERE p.id = $1", PRODUCT_COLUMNS);
  Ok(sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(&mut *conn).await?)
}

async fn fetch_products(conn: &mut PgConnection, ids: &[i64]) -> ShopResult<Vec<Product>> {
  let sql = format!("SELECT {} FROM products p WHERE p.id = ANY($1) ORDER BY p.id", PRODUCT_COLUMNS);
  Ok(sqlx::query_as::<_, Product>(&sql).bind(ids).fetch_all(&mut *conn).await?)
}

/// Resolves items and their products for a batch of orders, preserving the order of `orders`.
async fn load_details(conn: &mut PgConnection, orders: Vec<Order>) -> ShopResult<Vec<OrderDetail>> {
  if orders.is_empty() {
    return Ok(Vec::new());
  }
  let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
  let sql = format!(
    "SELECT {} FROM order_items WHERE order_id = ANY($1) ORDER BY id",
    ORDER_ITEM_COLUMNS
  );
  let items: Vec<OrderItem> = sqlx::query_as(&sql).bind(&order_ids).fetch_all(&mut *conn).await?;

  let mut product_ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
  product_ids.sort_unstable();
  product_ids.dedup();
  let products: HashMap<i64, Product> = fetch_products(&mut *conn, &product_ids)
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

  let mut items_by_order: HashMap<i64, Vec<OrderItemDetail>> = HashMap::new();
  for item in items {
    let product = products
      .get(&item.product_id)
      .cloned()
      .ok_or_else(|| ShopError::internal(format!("order item {} references missing product", item.id)))?;
    items_by_order.entry(item.order_id).or_default().push(OrderItemDetail::new(item, product));
  }

  Ok(
    orders
      .into_iter()
      .map(|order| OrderDetail {
        order_items: items_by_order.remove(&order.id).unwrap_or_default(),
        order,
      })
      .collect(),
  )
}

#[async_trait]
impl Store for PgStore {
  async fn begin(&self) -> ShopResult<Box<dyn StoreTx>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgTx { tx }))
  }

  async fn insert_user(&self, user: NewUser) -> ShopResult<User> {
    let sql = format!(
      "INSERT INTO users (username, password_hash, email, first_name, last_name) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
      USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&sql)
      .bind(&user.username)
      .bind(&user.password_hash)
      .bind(&user.email)
      .bind(&user.first_name)
      .bind(&user.last_name)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| conflict_on_unique(e, "username: A user with that username already exists."))
  }

  async fn user_by_username(&self, username: &str) -> ShopResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(username).fetch_optional(&self.pool).await?)
  }

  async fn user_by_id(&self, id: i64) -> ShopResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  async fn revoke_token(&self, jti: Uuid, user_id: i64, expires_at: DateTime<Utc>) -> ShopResult<bool> {
    let result = sqlx::query(
      "INSERT INTO revoked_tokens (jti, user_id, expires_at) VALUES ($1, $2, $3) ON CONFLICT (jti) DO NOTHING",
    )
    .bind(jti)
    .bind(user_id)
    .bind(expires_at)
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn is_token_revoked(&self, jti: Uuid) -> ShopResult<bool> {
    Ok(
      sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = $1)")
        .bind(jti)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn insert_category(&self, actor: i64, category: NewCategory) -> ShopResult<ProductCategory> {
    if let Some(parent_id) = category.parent_id {
      if self.category(parent_id).await?.is_none() {
        return Err(ShopError::validation(format!(
          "parent: Invalid pk \"{}\" - object does not exist.",
          parent_id
        )));
      }
    }
    let sql = format!(
      "INSERT INTO product_categories (parent_id, name, description, created_by, updated_by) VALUES ($1, $2, $3, $4, $4) RETURNING {}",
      CATEGORY_COLUMNS
    );
    Ok(
      sqlx::query_as(&sql)
        .bind(category.parent_id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(actor)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn categories(&self) -> ShopResult<Vec<ProductCategory>> {
    let sql = format!("SELECT {} FROM product_categories ORDER BY id", CATEGORY_COLUMNS);
    Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
  }

  async fn category(&self, id: i64) -> ShopResult<Option<ProductCategory>> {
    let sql = format!("SELECT {} FROM product_categories WHERE id = $1", CATEGORY_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
  }

  #[instrument(name = "PgStore::insert_product", skip(self, product))]
  async fn insert_product(&self, actor: i64, product: NewProduct) -> ShopResult<Product> {
    let mut tx = self.pool.begin().await?;
    ensure_categories_exist(&mut tx, &product.categories).await?;
    let id: i64 = sqlx::query_scalar(
      "INSERT INTO products (name, description, price, stock_quantity, created_by, updated_by) \
       VALUES ($1, $2, $3, $4, $5, $5) RETURNING id",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.stock_quantity)
    .bind(actor)
    .fetch_one(&mut *tx)
    .await?;
    replace_category_links(&mut tx, id, &product.categories).await?;
    let created = fetch_product(&mut tx, id)
      .await?
      .ok_or_else(|| ShopError::internal(format!("product {} vanished after insert", id)))?;
    tx.commit().await?;
    Ok(created)
  }

  async fn products_by_owner(&self, owner: i64) -> ShopResult<Vec<Product>> {
    let sql = format!(
      "SELECT {} FROM products p WHERE p.created_by = $1 ORDER BY p.id DESC",
      PRODUCT_COLUMNS
    );
    Ok(sqlx::query_as(&sql).bind(owner).fetch_all(&self.pool).await?)
  }

  async fn product(&self, id: i64) -> ShopResult<Option<Product>> {
    let mut conn = self.pool.acquire().await?;
    fetch_product(&mut conn, id).await
  }

  async fn update_product(&self, actor: i64, product_id: i64, patch: ProductPatch) -> ShopResult<Product> {
    let mut tx = self.pool.begin().await?;
    let sql = format!("SELECT {} FROM products p WHERE p.id = $1 FOR UPDATE OF p", PRODUCT_COLUMNS);
    let mut product: Product = sqlx::query_as(&sql)
      .bind(product_id)
      .fetch_optional(&mut *tx)
      .await?
      .ok_or_else(|| ShopError::not_found("No Product matches the given query."))?;
    let categories_changed = patch.categories.is_some();
    product.apply(patch);
    if categories_changed {
      ensure_categories_exist(&mut tx, &product.categories).await?;
    }
    sqlx::query(
      "UPDATE products SET name = $2, description = $3, price = $4, stock_quantity = $5, \
       updated_at = now(), updated_by = $6 WHERE id = $1",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.stock_quantity)
    .bind(actor)
    .execute(&mut *tx)
    .await?;
    if categories_changed {
      replace_category_links(&mut tx, product.id, &product.categories).await?;
    }
    let saved = fetch_product(&mut tx, product.id)
      .await?
      .ok_or_else(|| ShopError::not_found("No Product matches the given query."))?;
    tx.commit().await?;
    event!(Level::DEBUG, product_id, stock = saved.stock_quantity, "Product updated.");
    Ok(saved)
  }

  async fn delete_product(&self, id: i64) -> ShopResult<bool> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn insert_review(&self, actor: i64, product_id: i64, review: NewReview) -> ShopResult<ProductReview> {
    let sql = format!(
      "INSERT INTO product_reviews (product_id, user_id, text, rating, created_by, updated_by) \
       VALUES ($1, $2, $3, $4, $2, $2) RETURNING {}",
      REVIEW_COLUMNS
    );
    Ok(
      sqlx::query_as(&sql)
        .bind(product_id)
        .bind(actor)
        .bind(&review.text)
        .bind(review.rating)
        .fetch_one(&self.pool)
        .await?,
    )
  }

  async fn reviews_for_product(&self, product_id: i64) -> ShopResult<Vec<ProductReview>> {
    let sql = format!(
      "SELECT {} FROM product_reviews WHERE product_id = $1 ORDER BY id DESC",
      REVIEW_COLUMNS
    );
    Ok(sqlx::query_as(&sql).bind(product_id).fetch_all(&self.pool).await?)
  }

  async fn review(&self, product_id: i64, review_id: i64) -> ShopResult<Option<ProductReview>> {
    let sql = format!(
      "SELECT {} FROM product_reviews WHERE product_id = $1 AND id = $2",
      REVIEW_COLUMNS
    );
    Ok(
      sqlx::query_as(&sql)
        .bind(product_id)
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await?,
    )
  }

  async fn update_review(&self, actor: i64, review: &ProductReview) -> ShopResult<ProductReview> {
    let sql = format!(
      "UPDATE product_reviews SET text = $2, rating = $3, updated_at = now(), updated_by = $4 \
       WHERE id = $1 RETURNING {}",
      REVIEW_COLUMNS
    );
    sqlx::query_as(&sql)
      .bind(review.id)
      .bind(&review.text)
      .bind(review.rating)
      .bind(actor)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| ShopError::not_found("No ProductReview matches the given query."))
  }

  async fn delete_review(&self, review_id: i64) -> ShopResult<bool> {
    let result = sqlx::query("DELETE FROM product_reviews WHERE id = $1")
      .bind(review_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }

  async fn orders_for_user(&self, user_id: i64) -> ShopResult<Vec<OrderDetail>> {
    let mut conn = self.pool.acquire().await?;
    let sql = format!("SELECT {} FROM orders WHERE user_id = $1 ORDER BY id DESC", ORDER_COLUMNS);
    let orders: Vec<Order> = sqlx::query_as(&sql).bind(user_id).fetch_all(&mut *conn).await?;
    load_details(&mut conn, orders).await
  }

  async fn order_for_user(&self, order_id: i64, user_id: i64) -> ShopResult<Option<OrderDetail>> {
    let mut conn = self.pool.acquire().await?;
    let sql = format!("SELECT {} FROM orders WHERE id = $1 AND user_id = $2", ORDER_COLUMNS);
    let order: Option<Order> = sqlx::query_as(&sql)
      .bind(order_id)
      .bind(user_id)
      .fetch_optional(&mut *conn)
      .await?;
    Ok(load_details(&mut conn, order.into_iter().collect()).await?.pop())
  }

  async fn delete_order(&self, order_id: i64, user_id: i64) -> ShopResult<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND user_id = $2")
      .bind(order_id)
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }
}

pub struct PgTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
  async fn lock_order(&mut self, order_id: i64, user_id: i64) -> ShopResult<Option<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE",
      ORDER_COLUMNS
    );
    Ok(
      sqlx::query_as(&sql)
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?,
    )
  }

  async fn lock_products(&mut self, ids: &[i64]) -> ShopResult<Vec<Product>> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    let sql = format!(
      "SELECT {} FROM products p WHERE p.id = ANY($1) ORDER BY p.id FOR UPDATE OF p",
      PRODUCT_COLUMNS
    );
    Ok(sqlx::query_as(&sql).bind(&ids).fetch_all(&mut *self.tx).await?)
  }

  async fn set_stock(&mut self, actor: i64, product_id: i64, stock_quantity: i32) -> ShopResult<()> {
    sqlx::query("UPDATE products SET stock_quantity = $2, updated_at = now(), updated_by = $3 WHERE id = $1")
      .bind(product_id)
      .bind(stock_quantity)
      .bind(actor)
      .execute(&mut *self.tx)
      .await?;
    Ok(())
  }

  async fn insert_order(&mut self, actor: i64, order: NewOrder) -> ShopResult<Order> {
    let sql = format!(
      "INSERT INTO orders (user_id, total_price, order_status, created_by, updated_by) \
       VALUES ($1, $2, $3, $4, $4) RETURNING {}",
      ORDER_COLUMNS
    );
    Ok(
      sqlx::query_as(&sql)
        .bind(order.user_id)
        .bind(order.total_price)
        .bind(order.order_status)
        .bind(actor)
        .fetch_one(&mut *self.tx)
        .await?,
    )
  }

  async fn update_order(&mut self, actor: i64, order: &Order) -> ShopResult<Order> {
    let sql = format!(
      "UPDATE orders SET user_id = $2, total_price = $3, order_status = $4, updated_at = now(), updated_by = $5 \
       WHERE id = $1 RETURNING {}",
      ORDER_COLUMNS
    );
    sqlx::query_as(&sql)
      .bind(order.id)
      .bind(order.user_id)
      .bind(order.total_price)
      .bind(order.order_status)
      .bind(actor)
      .fetch_optional(&mut *self.tx)
      .await?
      .ok_or_else(|| ShopError::not_found("No Order matches the given query."))
  }

  async fn order_items(&mut self, order_id: i64) -> ShopResult<Vec<OrderItem>> {
    let sql = format!("SELECT {} FROM order_items WHERE order_id = $1 ORDER BY id", ORDER_ITEM_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(order_id).fetch_all(&mut *self.tx).await?)
  }

  async fn delete_order_items(&mut self, order_id: i64) -> ShopResult<u64> {
    let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1")
      .bind(order_id)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected())
  }

  async fn insert_order_items(
    &mut self,
    actor: i64,
    order_id: i64,
    lines: &[LineRequest],
  ) -> ShopResult<Vec<OrderItem>> {
    let sql = format!(
      "INSERT INTO order_items (order_id, product_id, quantity, created_by, updated_by) \
       VALUES ($1, $2, $3, $4, $4) RETURNING {}",
      ORDER_ITEM_COLUMNS
    );
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
      let item: OrderItem = sqlx::query_as(&sql)
        .bind(order_id)
        .bind(line.product)
        .bind(line.quantity)
        .bind(actor)
        .fetch_one(&mut *self.tx)
        .await?;
      items.push(item);
    }
    Ok(items)
  }

  async fn order_detail(&mut self, order_id: i64) -> ShopResult<Option<OrderDetail>> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    let order: Option<Order> = sqlx::query_as(&sql).bind(order_id).fetch_optional(&mut *self.tx).await?;
    Ok(load_details(&mut self.tx, order.into_iter().collect()).await?.pop())
  }

  async fn commit(self: Box<Self>) -> ShopResult<()> {
    let PgTx { tx } = *self;
    tx.commit().await?;
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> ShopResult<()> {
    let PgTx { tx } = *self;
    tx.rollback().await?;
    Ok(())
  }
}
