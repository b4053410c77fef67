// storefront-core/src/workflow/order.rs

//! Stock bookkeeping for order saves. Both functions run against an open
//! `StoreTx`; the caller commits or rolls back.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tracing::{event, instrument, Level};

use crate::error::{ShopError, ShopResult};
use crate::models::{LineRequest, NewOrder, Order, OrderStatus, Product};
use crate::store::StoreTx;

/// Ids referenced by `lines`, ascending and without repeats.
pub fn product_ids(lines: &[LineRequest]) -> Vec<i64> {
  let mut ids: Vec<i64> = lines.iter().map(|l| l.product).collect();
  ids.sort_unstable();
  ids.dedup();
  ids
}

/// Returns the stock of every item of `order` to its product and deletes the items.
///
/// No-op for shipped and delivered orders.
#[instrument(name = "order::restore_order_items", skip(tx, order), fields(order_id = order.id))]
pub async fn restore_order_items(tx: &mut dyn StoreTx, actor: i64, order: &Order) -> ShopResult<()> {
  if order.order_status.is_frozen() {
    event!(Level::DEBUG, status = %order.order_status, "Order is frozen, nothing restored.");
    return Ok(());
  }

  let items = tx.order_items(order.id).await?;
  if items.is_empty() {
    return Ok(());
  }

  let mut returned: BTreeMap<i64, i32> = BTreeMap::new();
  for item in &items {
    *returned.entry(item.product_id).or_default() += item.quantity;
  }
  let ids: Vec<i64> = returned.keys().copied().collect();
  let products = tx.lock_products(&ids).await?;
  for product in products {
    if let Some(quantity) = returned.get(&product.id) {
      let restored = product.stock_quantity.checked_add(*quantity).ok_or_else(|| {
        ShopError::validation(format!(
          "stock_quantity: Returning {} units would overflow the stock of product {}.",
          quantity, product.id
        ))
      })?;
      tx.set_stock(actor, product.id, restored).await?;
    }
  }

  let deleted = tx.delete_order_items(order.id).await?;
  event!(Level::DEBUG, deleted, "Order items restored to stock.");
  Ok(())
}

/// Writes the order header and its items, drawing stock for every line.
///
/// `existing` is the order being updated, with the status it was loaded with;
/// `None` creates a pending order. With no lines the order is saved with a
/// zero total and no items. Any failure leaves the transaction dirty and it
/// must be rolled back.
#[instrument(
  name = "order::process_order",
  skip(tx, pending_items, existing),
  fields(lines = pending_items.map_or(0, |l| l.len()), order_id = existing.as_ref().map(|o| o.id))
)]
pub async fn process_order(
  tx: &mut dyn StoreTx,
  pending_items: Option<&[LineRequest]>,
  requesting_user: i64,
  existing: Option<Order>,
) -> ShopResult<Order> {
  let lines = pending_items.unwrap_or_default();
  if lines.is_empty() {
    return save_header(tx, requesting_user, existing, Decimal::new(0, 2)).await;
  }

  let products: HashMap<i64, Product> = tx
    .lock_products(&product_ids(lines))
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();
  if let Some(missing) = lines.iter().find(|l| !products.contains_key(&l.product)) {
    return Err(ShopError::validation(format!(
      "order_items: Invalid pk \"{}\" - object does not exist.",
      missing.product
    )));
  }

  // Priced before any stock moves.
  let mut total_price: Decimal = lines
    .iter()
    .map(|l| products[&l.product].price * Decimal::from(l.quantity))
    .sum();
  total_price.rescale(2);

  let order = save_header(tx, requesting_user, existing, total_price).await?;

  let mut stock: HashMap<i64, i32> = products.iter().map(|(id, p)| (*id, p.stock_quantity)).collect();
  for line in lines {
    let available = stock.get(&line.product).copied().unwrap_or_default();
    if available < line.quantity {
      let product = &products[&line.product];
      event!(Level::INFO, product_id = product.id, available, requested = line.quantity, "Insufficient stock.");
      return Err(ShopError::StockInsufficient {
        product_id: product.id,
        product_name: product.name.clone(),
      });
    }
    let remaining = available - line.quantity;
    stock.insert(line.product, remaining);
    tx.set_stock(requesting_user, line.product, remaining).await?;
  }

  tx.insert_order_items(requesting_user, order.id, lines).await?;
  event!(Level::DEBUG, order_id = order.id, %total_price, "Order processed.");
  Ok(order)
}

async fn save_header(
  tx: &mut dyn StoreTx,
  requesting_user: i64,
  existing: Option<Order>,
  total_price: Decimal,
) -> ShopResult<Order> {
  match existing {
    Some(mut order) => {
      order.user_id = requesting_user;
      order.total_price = total_price;
      tx.update_order(requesting_user, &order).await
    }
    None => {
      tx.insert_order(
        requesting_user,
        NewOrder {
          user_id: requesting_user,
          total_price,
          order_status: OrderStatus::Pending,
        },
      )
      .await
    }
  }
}
