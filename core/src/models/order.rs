// storefront-core/src/models/order.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};

use super::{Audit, Product};
use crate::error::{ShopError, ShopResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  #[default]
  Pending,
  Shipped,
  Delivered,
  Canceled,
}

impl OrderStatus {
  /// Shipped and delivered orders keep their items forever.
  pub fn is_frozen(self) -> bool {
    matches!(self, OrderStatus::Shipped | OrderStatus::Delivered)
  }

  /// `pending -> shipped -> delivered`, `pending -> canceled`. Staying put is always allowed.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    self == next
      || matches!(
        (self, next),
        (Pending, Shipped) | (Shipped, Delivered) | (Pending, Canceled)
      )
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Canceled => "canceled",
    }
  }
}

impl std::fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Order {
  pub id: i64,
  #[serde(rename = "user")]
  pub user_id: i64,
  /// Derived from the line items at the last successful save; never edited directly.
  pub total_price: Decimal,
  pub order_status: OrderStatus,
  #[serde(skip)]
  #[sqlx(flatten)]
  pub audit: Audit,
}

/// Header fields for an order that has not been written yet.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub user_id: i64,
  pub total_price: Decimal,
  pub order_status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct OrderItem {
  pub id: i64,
  pub order_id: i64,
  pub product_id: i64,
  pub quantity: i32,
  #[serde(skip)]
  #[sqlx(flatten)]
  pub audit: Audit,
}

impl OrderItem {
  /// Line total at the given unit price; computed on read, never stored.
  pub fn total_price(&self, unit_price: Decimal) -> Decimal {
    unit_price * Decimal::from(self.quantity)
  }
}

/// One requested line of an order payload: `{"product": <id>, "quantity": <int>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
  pub product: i64,
  pub quantity: i32,
}

impl LineRequest {
  pub fn new(product: i64, quantity: i32) -> Self {
    Self { product, quantity }
  }

  pub fn validate(&self) -> ShopResult<()> {
    if self.quantity < 1 {
      return Err(ShopError::validation(format!(
        "order_items: quantity for product {} must be a positive integer.",
        self.product
      )));
    }
    Ok(())
  }
}

/// Order create/update payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPayload {
  #[serde(default)]
  pub order_items: Option<Vec<LineRequest>>,
  #[serde(default)]
  pub order_status: Option<OrderStatus>,
}

/// Read model of an order aggregate, with each line's product resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetail {
  #[serde(flatten)]
  pub order: Order,
  pub order_items: Vec<OrderItemDetail>,
}

impl OrderDetail {
  /// Σ(quantity × current product price) over the loaded lines.
  pub fn items_total(&self) -> Decimal {
    self.order_items.iter().map(|item| item.total_price).sum()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemDetail {
  pub id: i64,
  pub product: Product,
  pub quantity: i32,
  pub total_price: Decimal,
}

impl OrderItemDetail {
  pub fn new(item: OrderItem, product: Product) -> Self {
    Self {
      id: item.id,
      total_price: item.total_price(product.price),
      quantity: item.quantity,
      product,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn frozen_statuses() {
    assert!(!OrderStatus::Pending.is_frozen());
    assert!(OrderStatus::Shipped.is_frozen());
    assert!(OrderStatus::Delivered.is_frozen());
    assert!(!OrderStatus::Canceled.is_frozen());
  }

  #[test]
  fn status_moves_forward_only() {
    use OrderStatus::*;
    assert!(Pending.can_transition_to(Shipped));
    assert!(Shipped.can_transition_to(Delivered));
    assert!(Pending.can_transition_to(Canceled));
    assert!(Shipped.can_transition_to(Shipped));
    assert!(!Delivered.can_transition_to(Pending));
    assert!(!Shipped.can_transition_to(Canceled));
    assert!(!Canceled.can_transition_to(Pending));
  }

  #[test]
  fn payload_accepts_missing_items() {
    let payload: OrderPayload = serde_json::from_str(r#"{"order_status": "shipped"}"#).unwrap();
    assert!(payload.order_items.is_none());
    assert_eq!(payload.order_status, Some(OrderStatus::Shipped));

    let payload: OrderPayload =
      serde_json::from_str(r#"{"order_items": [{"product": 1, "quantity": 2}]}"#).unwrap();
    assert_eq!(payload.order_items, Some(vec![LineRequest::new(1, 2)]));
  }

  #[test]
  fn non_positive_quantity_is_rejected() {
    assert!(LineRequest::new(1, 0).validate().is_err());
    assert!(LineRequest::new(1, 1).validate().is_ok());
  }
}
