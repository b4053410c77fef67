// storefront-core/src/workflow/orders.rs

//! Order entry points used by the API layer. Every call is scoped to the
//! acting user's own orders.

use std::sync::Arc;

use tracing::{event, info, instrument, Level};

use super::contexts::OrderCtxData;
use super::order_pipeline::ORDER_NOT_FOUND;
use crate::error::{ShopError, ShopResult};
use crate::models::{OrderDetail, OrderPayload};
use crate::pipeline::{ContextData, PipelineResult};
use crate::registry::Workflows;
use crate::store::Store;

/// Creates (`order_id: None`) or updates one of `actor`'s orders.
///
/// Any failure rolls the whole save back: header, items and stock.
#[instrument(name = "orders::save_order", skip(workflows, store, payload), err(Display))]
pub async fn save_order(
  workflows: &Workflows,
  store: Arc<dyn Store>,
  actor: i64,
  order_id: Option<i64>,
  payload: OrderPayload,
) -> ShopResult<OrderDetail> {
  let ctx = ContextData::new(OrderCtxData::new(
    store,
    actor,
    order_id,
    payload.order_status,
    payload.order_items,
  ));

  let outcome = workflows.run(ctx.clone()).await;

  // Whatever is still in the slot never reached commit.
  let leftover = ctx.read().tx.clone();
  if let Some(tx) = leftover.take().await {
    if let Err(rollback_err) = tx.rollback().await {
      event!(Level::ERROR, error = %rollback_err, "Order transaction rollback failed.");
    }
  }

  match outcome? {
    PipelineResult::Completed => {}
    PipelineResult::Stopped => return Err(ShopError::internal("order pipeline stopped before completing")),
  }

  let detail = ctx
    .write()
    .result
    .take()
    .ok_or_else(|| ShopError::internal("order pipeline produced no result"))?;
  info!(order_id = detail.order.id, total = %detail.order.total_price, "Order saved.");
  Ok(detail)
}

#[instrument(name = "orders::list_orders", skip(store))]
pub async fn list_orders(store: &dyn Store, actor: i64) -> ShopResult<Vec<OrderDetail>> {
  store.orders_for_user(actor).await
}

#[instrument(name = "orders::get_order", skip(store))]
pub async fn get_order(store: &dyn Store, actor: i64, order_id: i64) -> ShopResult<OrderDetail> {
  store
    .order_for_user(order_id, actor)
    .await?
    .ok_or_else(|| ShopError::not_found(ORDER_NOT_FOUND))
}

/// Deletes the order and its items. Reserved stock stays drawn.
#[instrument(name = "orders::delete_order", skip(store))]
pub async fn delete_order(store: &dyn Store, actor: i64, order_id: i64) -> ShopResult<()> {
  if !store.delete_order(order_id, actor).await? {
    return Err(ShopError::not_found(ORDER_NOT_FOUND));
  }
  info!(order_id, "Order deleted.");
  Ok(())
}
