// storefront-core/src/registry.rs

//! `Workflows`: the type-keyed registry of pipelines. Callers hand it a
//! `ContextData<T>` and it dispatches to the pipeline registered for `T`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{event, instrument, Level};

use crate::error::{ShopError, ShopResult};
use crate::pipeline::{ContextData, Pipeline, PipelineResult};

#[async_trait]
trait AnyPipelineRunner: Send + Sync {
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> ShopResult<PipelineResult>;
}

struct PipelineWrapper<T: 'static + Send + Sync> {
  pipeline: Arc<Pipeline<T>>,
}

#[async_trait]
impl<T: 'static + Send + Sync> AnyPipelineRunner for PipelineWrapper<T> {
  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> ShopResult<PipelineResult> {
    let ctx_data = match ctx_obj.downcast::<ContextData<T>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        return Err(ShopError::internal(format!(
          "context type mismatch, expected {}",
          std::any::type_name::<ContextData<T>>()
        )))
      }
    };
    self.pipeline.run(ctx_data).await
  }
}

#[derive(Default)]
pub struct Workflows {
  registry: RwLock<HashMap<TypeId, Arc<dyn AnyPipelineRunner>>>,
}

impl Workflows {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `pipeline` as the handler for context type `T`, replacing any earlier one.
  pub fn register<T: 'static + Send + Sync>(&self, pipeline: Pipeline<T>) {
    event!(Level::DEBUG, pipeline = %pipeline.name(), ctx_type = %std::any::type_name::<T>(), "Registering pipeline.");
    let wrapper = PipelineWrapper {
      pipeline: Arc::new(pipeline),
    };
    self.registry.write().insert(TypeId::of::<T>(), Arc::new(wrapper));
  }

  pub fn is_registered<T: 'static + Send + Sync>(&self) -> bool {
    self.registry.read().contains_key(&TypeId::of::<T>())
  }

  #[instrument(name = "Workflows::run", skip_all, fields(ctx_type = %std::any::type_name::<T>()))]
  pub async fn run<T: 'static + Send + Sync>(&self, ctx_data: ContextData<T>) -> ShopResult<PipelineResult> {
    let runner = self
      .registry
      .read()
      .get(&TypeId::of::<T>())
      .cloned()
      .ok_or_else(|| ShopError::WorkflowNotRegistered {
        type_name: std::any::type_name::<T>().to_string(),
      })?;
    runner.run_erased(Box::new(ctx_data)).await
  }
}
