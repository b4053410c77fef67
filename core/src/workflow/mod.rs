// storefront-core/src/workflow/mod.rs

//! Business flows. Orders, sign-up and sign-in are pipelines registered in a
//! `Workflows` registry; the rest are plain async functions over a `Store`.

pub mod accounts;
pub mod contexts;
pub mod order;
pub mod order_pipeline;
pub mod orders;
pub mod signin_pipeline;
pub mod signup_pipeline;

pub use accounts::{authenticate, login, logout, register};
pub use contexts::{OrderCtxData, SigninCtxData, SignupCtxData, TxSlot};
pub use order::{process_order, restore_order_items};
pub use orders::{delete_order, get_order, list_orders, save_order};

use crate::registry::Workflows;

/// A registry with every pipeline of the application.
pub fn standard_workflows() -> Workflows {
  let workflows = Workflows::new();
  order_pipeline::register_order_pipeline(&workflows);
  signup_pipeline::register_signup_pipeline(&workflows);
  signin_pipeline::register_signin_pipeline(&workflows);
  tracing::info!("Application pipelines registered.");
  workflows
}
