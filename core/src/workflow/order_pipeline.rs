// storefront-core/src/workflow/order_pipeline.rs

//! The order save pipeline: one create or update, inside one store transaction.

use std::sync::Arc;

use tracing::{event, warn, Level};

use super::contexts::{open_tx, OrderCtxData};
use super::order::{process_order, product_ids, restore_order_items};
use crate::error::{ShopError, ShopResult};
use crate::models::OrderStatus;
use crate::pipeline::{ContextData, Pipeline, PipelineControl, SkipCondition};
use crate::registry::Workflows;

pub const ORDER_NOT_FOUND: &str = "No Order matches the given query.";
pub const ORDER_NOT_MODIFIABLE: &str = "Order status not eligible for modification";

fn skip_when(
  condition: impl Fn(&OrderCtxData) -> bool + Send + Sync + 'static,
) -> Option<SkipCondition<OrderCtxData>> {
  let skip: SkipCondition<OrderCtxData> = Arc::new(move |ctx: ContextData<OrderCtxData>| condition(&ctx.read()));
  Some(skip)
}

pub fn order_pipeline() -> Pipeline<OrderCtxData> {
  let mut p = Pipeline::<OrderCtxData>::new(
    "order_save",
    &[
      ("validate_request", false, None),
      ("begin_transaction", false, None),
      ("load_order", false, skip_when(|c| c.is_create())),
      ("check_modifiable", false, skip_when(|c| c.is_create())),
      (
        "lock_products",
        false,
        skip_when(|c| match &c.order_items {
          None => true,
          Some(lines) => lines.is_empty() && c.is_create(),
        }),
      ),
      ("restore_order_items", false, skip_when(|c| c.is_create() || c.order_items.is_none())),
      // An update without items leaves items and total alone.
      ("process_order", false, skip_when(|c| !c.is_create() && c.order_items.is_none())),
      // Last, so restore and process see the status the order was loaded with.
      ("apply_status", false, skip_when(|c| c.is_create() || c.requested_status.is_none())),
      ("load_result", false, None),
      ("commit_transaction", false, None),
    ],
  );

  p.on("validate_request", validate_request);
  p.on("begin_transaction", begin_transaction);
  p.on("load_order", load_order);
  p.on("check_modifiable", check_modifiable);
  p.on("lock_products", lock_products);
  p.on("restore_order_items", restore_items);
  p.on("process_order", process_items);
  p.on("apply_status", apply_status);
  p.on("load_result", load_result);
  p.on("commit_transaction", commit_transaction);
  p
}

async fn validate_request(ctx: ContextData<OrderCtxData>) -> ShopResult<PipelineControl> {
  let guard = ctx.read();
  if let Some(lines) = &guard.order_items {
    for line in lines {
      line.validate()?;
    }
  }
  if guard.is_create() {
    if let Some(status) = guard.requested_status.filter(|s| *s != OrderStatus::Pending) {
      return Err(ShopError::validation(format!(
        "order_status: New orders must be \"pending\", not \"{}\".",
        status
      )));
    }
  }
  Ok(PipelineControl::Continue)
}

async fn begin_transaction(ctx: ContextData<OrderCtxData>) -> ShopResult<PipelineControl> {
  let (store, slot) = {
    let guard = ctx.read();
    (guard.store.clone(), guard.tx.clone())
  };
  slot.put(store.begin().await?).await;
  event!(Level::TRACE, "Order transaction opened.");
  Ok(PipelineControl::Continue)
}

async fn load_order(ctx: ContextData<OrderCtxData>) -> ShopResult<PipelineControl> {
  let (slot, actor, order_id) = {
    let guard = ctx.read();
    (guard.tx.clone(), guard.actor, guard.order_id)
  };
  let order_id = order_id.ok_or_else(|| ShopError::internal("load_order without an order id"))?;
  let order = {
    let mut held = slot.lock().await;
    open_tx(&mut held)?.lock_order(order_id, actor).await?
  };
  let order = order.ok_or_else(|| ShopError::not_found(ORDER_NOT_FOUND))?;
  ctx.write().order = Some(order);
  Ok(PipelineControl::Continue)
}

/// Shipped and delivered orders keep their items; status-only updates still pass.
async fn check_modifiable(ctx: ContextData<OrderCtxData>) -> ShopResult<PipelineControl> {
  let guard = ctx.read();
  let frozen = guard.order.as_ref().is_some_and(|o| o.order_status.is_frozen());
  if frozen && guard.order_items.is_some() {
    warn!(order_id = ?guard.order_id, "Attempt to change items of a frozen order.");
    return Err(ShopError::OrderException(ORDER_NOT_MODIFIABLE.to_string()));
  }
  Ok(PipelineControl::Continue)
}

async fn apply_status(ctx: ContextData<OrderCtxData>) -> ShopResult<PipelineControl> {
  let (slot, actor, order) = {
    let mut guard = ctx.write();
    let requested = guard.requested_status;
    let order = guard
      .order
      .as_mut()
      .ok_or_else(|| ShopError::internal("apply_status without a loaded order"))?;
    if let Some(next) = requested {
      if !order.order_status.can_transition_to(next) {
        return Err(ShopError::validation(format!(
          "order_status: Cannot change order status from \"{}\" to \"{}\".",
          order.order_status, next
        )));
      }
      order.order_status = next;
    }
    let order = order.clone();
    (guard.tx.clone(), guard.actor, order)
  };
  let saved = {
    let mut held = slot.lock().await;
    open_tx(&mut held)?.update_order(actor, &order).await?
  };
  ctx.write().order = Some(saved);
  Ok(PipelineControl::Continue)
}

/// Locks every product the save can touch, old lines and new, in one ascending pass.
async fn lock_products(ctx: ContextData<OrderCtxData>) -> ShopResult<PipelineControl> {
  let (slot, order_id, mut ids) = {
    let guard = ctx.read();
    let lines = guard.order_items.as_deref().unwrap_or_default();
    (guard.tx.clone(), guard.order.as_ref().map(|o| o.id), product_ids(lines))
  };
  let mut held = slot.lock().await;
  let tx = open_tx(&mut held)?;
  if let Some(order_id) = order_id {
    ids.extend(tx.order_items(order_id).await?.iter().map(|i| i.product_id));
  }
  ids.sort_unstable();
  ids.dedup();
  let locked = tx.lock_products(&ids).await?;
  event!(Level::DEBUG, requested = ids.len(), locked = locked.len(), "Products locked.");
  Ok(PipelineControl::Continue)
}

async fn restore_items(ctx: ContextData<OrderCtxData>) -> ShopResult<PipelineControl> {
  let (slot, actor, order) = {
    let guard = ctx.read();
    (guard.tx.clone(), guard.actor, guard.order.clone())
  };
  let order = order.ok_or_else(|| ShopError::internal("restore_order_items without a loaded order"))?;
  let mut held = slot.lock().await;
  restore_order_items(open_tx(&mut held)?, actor, &order).await?;
  Ok(PipelineControl::Continue)
}

async fn process_items(ctx: ContextData<OrderCtxData>) -> ShopResult<PipelineControl> {
  let (slot, actor, lines, existing) = {
    let guard = ctx.read();
    (guard.tx.clone(), guard.actor, guard.order_items.clone(), guard.order.clone())
  };
  let saved = {
    let mut held = slot.lock().await;
    process_order(open_tx(&mut held)?, lines.as_deref(), actor, existing).await?
  };
  ctx.write().order = Some(saved);
  Ok(PipelineControl::Continue)
}

async fn load_result(ctx: ContextData<OrderCtxData>) -> ShopResult<PipelineControl> {
  let (slot, order_id) = {
    let guard = ctx.read();
    (guard.tx.clone(), guard.order.as_ref().map(|o| o.id))
  };
  let order_id = order_id.ok_or_else(|| ShopError::internal("no order was saved"))?;
  let detail = {
    let mut held = slot.lock().await;
    open_tx(&mut held)?.order_detail(order_id).await?
  };
  ctx.write().result = Some(detail.ok_or_else(|| ShopError::not_found(ORDER_NOT_FOUND))?);
  Ok(PipelineControl::Continue)
}

async fn commit_transaction(ctx: ContextData<OrderCtxData>) -> ShopResult<PipelineControl> {
  let slot = ctx.read().tx.clone();
  let tx = slot
    .take()
    .await
    .ok_or_else(|| ShopError::internal("order transaction is not open"))?;
  tx.commit().await?;
  event!(Level::TRACE, "Order transaction committed.");
  Ok(PipelineControl::Continue)
}

pub fn register_order_pipeline(workflows: &Workflows) {
  workflows.register(order_pipeline());
}
