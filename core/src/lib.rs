// storefront-core/src/lib.rs

//! Domain core of the storefront backend.
//!
//! - `models`: accounts, catalog and order records, each with an embedded `Audit`.
//! - `store`: the persistence seam, with PostgreSQL and in-memory backends.
//! - `pipeline` / `registry`: a named-step pipeline engine and its type-keyed registry.
//! - `workflow`: order saves with stock bookkeeping, sign-up, sign-in, logout.
//! - `catalog`: product, review and category operations.
//! - `auth`: password hashing and JWTs.
//!
//! Every mutating call takes the acting user's id explicitly.

pub mod auth;
pub mod catalog;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod store;
pub mod workflow;

pub use crate::error::{ShopError, ShopResult};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult, StepDef};
pub use crate::registry::Workflows;
pub use crate::store::{MemoryStore, PgStore, Store, StoreTx};
pub use crate::workflow::standard_workflows;
