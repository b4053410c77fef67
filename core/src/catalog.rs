// storefront-core/src/catalog.rs

//! Product, review and category operations with their ownership rules.
//!
//! Products are private to their creator: a missing product is `NotFound`,
//! someone else's is `PermissionDenied`. Reviews are readable by anyone and
//! writable by their author only.

use tracing::{info, instrument};

use crate::error::{ShopError, ShopResult};
use crate::models::{NewCategory, NewProduct, NewReview, Product, ProductCategory, ProductPatch, ProductReview, ReviewPatch};
use crate::store::Store;

pub const PRODUCT_NOT_FOUND: &str = "No Product matches the given query.";
pub const REVIEW_NOT_FOUND: &str = "No ProductReview matches the given query.";
pub const CATEGORY_NOT_FOUND: &str = "No ProductCategory matches the given query.";
pub const NOT_PERMITTED: &str = "You do not have permission to perform this action.";

// --- Products ---

pub async fn list_products(store: &dyn Store, actor: i64) -> ShopResult<Vec<Product>> {
  store.products_by_owner(actor).await
}

#[instrument(name = "catalog::create_product", skip(store, product), fields(name = %product.name))]
pub async fn create_product(store: &dyn Store, actor: i64, product: NewProduct) -> ShopResult<Product> {
  let product = product.normalized()?;
  let created = store.insert_product(actor, product).await?;
  info!(product_id = created.id, "Product created.");
  Ok(created)
}

/// The product, if it exists and `actor` created it.
pub async fn owned_product(store: &dyn Store, actor: i64, product_id: i64) -> ShopResult<Product> {
  let product = store
    .product(product_id)
    .await?
    .ok_or_else(|| ShopError::not_found(PRODUCT_NOT_FOUND))?;
  if product.owner() != Some(actor) {
    return Err(ShopError::PermissionDenied(NOT_PERMITTED.to_string()));
  }
  Ok(product)
}

#[instrument(name = "catalog::update_product", skip(store, patch))]
pub async fn update_product(store: &dyn Store, actor: i64, product_id: i64, patch: ProductPatch) -> ShopResult<Product> {
  let patch = patch.normalized()?;
  owned_product(store, actor, product_id).await?;
  store.update_product(actor, product_id, patch).await
}

#[instrument(name = "catalog::delete_product", skip(store))]
pub async fn delete_product(store: &dyn Store, actor: i64, product_id: i64) -> ShopResult<()> {
  owned_product(store, actor, product_id).await?;
  if !store.delete_product(product_id).await? {
    return Err(ShopError::not_found(PRODUCT_NOT_FOUND));
  }
  info!(product_id, "Product deleted.");
  Ok(())
}

// --- Reviews ---

async fn ensure_product(store: &dyn Store, product_id: i64) -> ShopResult<()> {
  match store.product(product_id).await? {
    Some(_) => Ok(()),
    None => Err(ShopError::not_found(PRODUCT_NOT_FOUND)),
  }
}

pub async fn list_reviews(store: &dyn Store, product_id: i64) -> ShopResult<Vec<ProductReview>> {
  ensure_product(store, product_id).await?;
  store.reviews_for_product(product_id).await
}

#[instrument(name = "catalog::create_review", skip(store, review))]
pub async fn create_review(
  store: &dyn Store,
  actor: i64,
  product_id: i64,
  review: NewReview,
) -> ShopResult<ProductReview> {
  ensure_product(store, product_id).await?;
  review.validate()?;
  store.insert_review(actor, product_id, review).await
}

pub async fn get_review(store: &dyn Store, product_id: i64, review_id: i64) -> ShopResult<ProductReview> {
  store
    .review(product_id, review_id)
    .await?
    .ok_or_else(|| ShopError::not_found(REVIEW_NOT_FOUND))
}

async fn authored_review(store: &dyn Store, actor: i64, product_id: i64, review_id: i64) -> ShopResult<ProductReview> {
  let review = get_review(store, product_id, review_id).await?;
  if review.user_id != actor {
    return Err(ShopError::PermissionDenied(NOT_PERMITTED.to_string()));
  }
  Ok(review)
}

#[instrument(name = "catalog::update_review", skip(store, patch))]
pub async fn update_review(
  store: &dyn Store,
  actor: i64,
  product_id: i64,
  review_id: i64,
  patch: ReviewPatch,
) -> ShopResult<ProductReview> {
  let mut review = authored_review(store, actor, product_id, review_id).await?;
  patch.validate()?;
  review.apply(patch);
  store.update_review(actor, &review).await
}

#[instrument(name = "catalog::delete_review", skip(store))]
pub async fn delete_review(store: &dyn Store, actor: i64, product_id: i64, review_id: i64) -> ShopResult<()> {
  authored_review(store, actor, product_id, review_id).await?;
  if !store.delete_review(review_id).await? {
    return Err(ShopError::not_found(REVIEW_NOT_FOUND));
  }
  Ok(())
}

// --- Categories ---

pub async fn list_categories(store: &dyn Store) -> ShopResult<Vec<ProductCategory>> {
  store.categories().await
}

#[instrument(name = "catalog::create_category", skip(store, category), fields(name = %category.name))]
pub async fn create_category(store: &dyn Store, actor: i64, category: NewCategory) -> ShopResult<ProductCategory> {
  category.validate()?;
  store.insert_category(actor, category).await
}

pub async fn get_category(store: &dyn Store, category_id: i64) -> ShopResult<ProductCategory> {
  store
    .category(category_id)
    .await?
    .ok_or_else(|| ShopError::not_found(CATEGORY_NOT_FOUND))
}
