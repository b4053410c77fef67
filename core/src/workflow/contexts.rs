// storefront-core/src/workflow/contexts.rs

//! Per-run state for each registered pipeline. Handlers receive these wrapped
//! in `ContextData`.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::auth::{TokenPair, TokenService};
use crate::error::{ShopError, ShopResult};
use crate::models::{LineRequest, Order, OrderDetail, OrderStatus, Registration, User};
use crate::store::{Store, StoreTx};

/// The open store transaction of one order run.
///
/// Lives outside the `ContextData` lock so handlers can hold it across
/// `.await` points; the context lock itself never is.
#[derive(Clone, Default)]
pub struct TxSlot(Arc<Mutex<Option<Box<dyn StoreTx>>>>);

impl TxSlot {
  pub async fn put(&self, tx: Box<dyn StoreTx>) {
    *self.0.lock().await = Some(tx);
  }

  pub async fn take(&self) -> Option<Box<dyn StoreTx>> {
    self.0.lock().await.take()
  }

  pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, Option<Box<dyn StoreTx>>> {
    self.0.lock().await
  }
}

/// Borrows the transaction out of a locked slot.
pub(crate) fn open_tx<'a>(slot: &'a mut Option<Box<dyn StoreTx>>) -> ShopResult<&'a mut (dyn StoreTx + 'static)> {
  slot
    .as_deref_mut()
    .ok_or_else(|| ShopError::internal("order transaction is not open"))
}

/// One order create or update.
#[derive(Clone)]
pub struct OrderCtxData {
  pub store: Arc<dyn Store>,
  /// The authenticated caller; owner of the order and author of every write.
  pub actor: i64,
  /// `None` creates a new order.
  pub order_id: Option<i64>,
  pub requested_status: Option<OrderStatus>,
  /// `None` leaves the items of an existing order untouched.
  pub order_items: Option<Vec<LineRequest>>,
  pub tx: TxSlot,
  /// Header as loaded, then as last written.
  pub order: Option<Order>,
  pub result: Option<OrderDetail>,
}

impl OrderCtxData {
  pub fn new(
    store: Arc<dyn Store>,
    actor: i64,
    order_id: Option<i64>,
    requested_status: Option<OrderStatus>,
    order_items: Option<Vec<LineRequest>>,
  ) -> Self {
    Self {
      store,
      actor,
      order_id,
      requested_status,
      order_items,
      tx: TxSlot::default(),
      order: None,
      result: None,
    }
  }

  pub fn is_create(&self) -> bool {
    self.order_id.is_none()
  }
}

#[derive(Clone)]
pub struct SignupCtxData {
  pub store: Arc<dyn Store>,
  pub registration: Registration,
  pub created_user: Option<User>,
}

#[derive(Clone)]
pub struct SigninCtxData {
  pub store: Arc<dyn Store>,
  pub tokens: Arc<TokenService>,
  pub username: Option<String>,
  pub password: Option<String>,
  pub user: Option<User>,
  pub issued: Option<TokenPair>,
}
