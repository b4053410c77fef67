// storefront-core/src/pipeline/mod.rs

//! A small step-pipeline engine. Business flows (order saves, sign-up,
//! sign-in) are declared as named steps and executed against shared context.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::Pipeline;
pub use step::{SkipCondition, StepDef};
