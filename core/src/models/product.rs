// storefront-core/src/models/product.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Audit;
use crate::error::{ShopError, ShopResult};

const MAX_NAME_LEN: usize = 255;
const PRICE_MAX_DIGITS: u32 = 10;
const PRICE_DECIMAL_PLACES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Product {
  pub id: i64,
  pub name: String,
  pub description: String,
  pub price: Decimal,
  pub stock_quantity: i32,
  /// Ids of the categories this product is filed under, ascending.
  pub categories: Vec<i64>,
  #[serde(flatten)]
  #[sqlx(flatten)]
  pub audit: Audit,
}

impl Product {
  /// Creator of the product; only this user may read or change it through the API.
  pub fn owner(&self) -> Option<i64> {
    self.audit.created_by
  }

  pub fn apply(&mut self, patch: ProductPatch) {
    if let Some(name) = patch.name {
      self.name = name;
    }
    if let Some(description) = patch.description {
      self.description = description;
    }
    if let Some(price) = patch.price {
      self.price = price;
    }
    if let Some(stock_quantity) = patch.stock_quantity {
      self.stock_quantity = stock_quantity;
    }
    if let Some(categories) = patch.categories {
      self.categories = normalize_ids(categories);
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub price: Decimal,
  pub stock_quantity: i32,
  #[serde(default)]
  pub categories: Vec<i64>,
}

impl NewProduct {
  /// Validates the payload and brings price/categories into their stored form.
  pub fn normalized(mut self) -> ShopResult<Self> {
    validate_name("name", &self.name)?;
    self.price = normalize_price(self.price)?;
    validate_stock(self.stock_quantity)?;
    self.categories = normalize_ids(self.categories);
    Ok(self)
  }
}

impl From<NewProduct> for ProductPatch {
  fn from(p: NewProduct) -> Self {
    ProductPatch {
      name: Some(p.name),
      description: Some(p.description),
      price: Some(p.price),
      stock_quantity: Some(p.stock_quantity),
      categories: Some(p.categories),
    }
  }
}

/// Partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<Decimal>,
  pub stock_quantity: Option<i32>,
  pub categories: Option<Vec<i64>>,
}

impl ProductPatch {
  pub fn normalized(mut self) -> ShopResult<Self> {
    if let Some(name) = &self.name {
      validate_name("name", name)?;
    }
    if let Some(price) = self.price {
      self.price = Some(normalize_price(price)?);
    }
    if let Some(stock) = self.stock_quantity {
      validate_stock(stock)?;
    }
    self.categories = self.categories.map(normalize_ids);
    Ok(self)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ProductCategory {
  pub id: i64,
  pub parent_id: Option<i64>,
  pub name: String,
  pub description: String,
  #[serde(flatten)]
  #[sqlx(flatten)]
  pub audit: Audit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
  #[serde(default, alias = "parent")]
  pub parent_id: Option<i64>,
  pub name: String,
  #[serde(default)]
  pub description: String,
}

impl NewCategory {
  pub fn validate(&self) -> ShopResult<()> {
    validate_name("name", &self.name)
  }
}

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ProductReview {
  pub id: i64,
  pub product_id: i64,
  pub user_id: i64,
  pub text: String,
  pub rating: i32,
  #[serde(flatten)]
  #[sqlx(flatten)]
  pub audit: Audit,
}

impl ProductReview {
  pub fn apply(&mut self, patch: ReviewPatch) {
    if let Some(text) = patch.text {
      self.text = text;
    }
    if let Some(rating) = patch.rating {
      self.rating = rating;
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
  pub text: String,
  pub rating: i32,
}

impl NewReview {
  pub fn validate(&self) -> ShopResult<()> {
    validate_text(&self.text)?;
    validate_rating(self.rating)
  }
}

impl From<NewReview> for ReviewPatch {
  fn from(r: NewReview) -> Self {
    ReviewPatch {
      text: Some(r.text),
      rating: Some(r.rating),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
  pub text: Option<String>,
  pub rating: Option<i32>,
}

impl ReviewPatch {
  pub fn validate(&self) -> ShopResult<()> {
    if let Some(text) = &self.text {
      validate_text(text)?;
    }
    match self.rating {
      Some(rating) => validate_rating(rating),
      None => Ok(()),
    }
  }
}

fn validate_name(field: &str, value: &str) -> ShopResult<()> {
  if value.trim().is_empty() {
    return Err(ShopError::validation(format!("{}: This field may not be blank.", field)));
  }
  if value.chars().count() > MAX_NAME_LEN {
    return Err(ShopError::validation(format!(
      "{}: Ensure this field has no more than {} characters.",
      field, MAX_NAME_LEN
    )));
  }
  Ok(())
}

fn validate_text(text: &str) -> ShopResult<()> {
  if text.trim().is_empty() {
    return Err(ShopError::validation("text: This field may not be blank."));
  }
  Ok(())
}

fn validate_rating(rating: i32) -> ShopResult<()> {
  if !(MIN_RATING..=MAX_RATING).contains(&rating) {
    return Err(ShopError::validation(format!(
      "rating: \"{}\" is not a valid choice.",
      rating
    )));
  }
  Ok(())
}

fn validate_stock(stock: i32) -> ShopResult<()> {
  if stock < 0 {
    return Err(ShopError::validation(
      "stock_quantity: Ensure this value is greater than or equal to 0.",
    ));
  }
  Ok(())
}

/// Prices are NUMERIC(10,2): at most two decimal places, eight integer digits, never negative.
pub(crate) fn normalize_price(price: Decimal) -> ShopResult<Decimal> {
  if price.is_sign_negative() && !price.is_zero() {
    return Err(ShopError::validation("price: Ensure this value is greater than or equal to 0."));
  }
  let mut price = price.normalize();
  if price.scale() > PRICE_DECIMAL_PLACES {
    return Err(ShopError::validation(format!(
      "price: Ensure that there are no more than {} decimal places.",
      PRICE_DECIMAL_PLACES
    )));
  }
  price.rescale(PRICE_DECIMAL_PLACES);
  let integer_digits = price.trunc().abs().normalize().to_string().trim_start_matches('0').len() as u32;
  if integer_digits > PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES {
    return Err(ShopError::validation(format!(
      "price: Ensure that there are no more than {} digits in total.",
      PRICE_MAX_DIGITS
    )));
  }
  Ok(price)
}

fn normalize_ids(mut ids: Vec<i64>) -> Vec<i64> {
  ids.sort_unstable();
  ids.dedup();
  ids
}
