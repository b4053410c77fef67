// storefront-core/src/pipeline/definition.rs

//! `Pipeline<T>`: an ordered list of named steps, each carrying `before`, `on`
//! and `after` handlers that operate on a shared `ContextData<T>`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{event, Level};

use super::{ContextData, PipelineControl, SkipCondition, StepDef};
use crate::error::ShopResult;

pub(crate) type HandlerFuture = Pin<Box<dyn Future<Output = ShopResult<PipelineControl>> + Send>>;
pub(crate) type Handler<T> = Box<dyn Fn(ContextData<T>) -> HandlerFuture + Send + Sync>;

pub struct Pipeline<T: 'static + Send + Sync> {
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<T>>,
  pub(crate) before: HashMap<String, Vec<Handler<T>>>,
  pub(crate) on: HashMap<String, Vec<Handler<T>>>,
  pub(crate) after: HashMap<String, Vec<Handler<T>>>,
}

impl<T: 'static + Send + Sync> Pipeline<T> {
  /// Builds a pipeline from `(step name, optional, skip condition)` triples, run in order.
  pub fn new(name: &str, step_defs: &[(&str, bool, Option<SkipCondition<T>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, optional, skip_if)| StepDef {
        name: (*step_name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      name: name.to_string(),
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Panics on an unknown step name; that is a wiring mistake, not a runtime condition.
  fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!(
        "pipeline '{}' has no step named '{}'",
        self.name, step_name
      );
    }
  }

  fn boxed<F>(handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static) -> Handler<T>
  where
    F: Future<Output = ShopResult<PipelineControl>> + Send + 'static,
  {
    Box::new(move |ctx| Box::pin(handler_fn(ctx)))
  }

  pub fn before<F>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = ShopResult<PipelineControl>> + Send + 'static,
  {
    self.ensure_step_exists(step_name);
    self.before.entry(step_name.to_string()).or_default().push(Self::boxed(handler_fn));
  }

  pub fn on<F>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = ShopResult<PipelineControl>> + Send + 'static,
  {
    self.ensure_step_exists(step_name);
    self.on.entry(step_name.to_string()).or_default().push(Self::boxed(handler_fn));
    event!(Level::TRACE, pipeline = %self.name, %step_name, "on handler registered.");
  }

  pub fn after<F>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = ShopResult<PipelineControl>> + Send + 'static,
  {
    self.ensure_step_exists(step_name);
    self.after.entry(step_name.to_string()).or_default().push(Self::boxed(handler_fn));
  }

  /// Replaces the skip condition of an existing step.
  pub fn skip_if(&mut self, step_name: &str, condition: impl Fn(ContextData<T>) -> bool + Send + Sync + 'static) {
    self.ensure_step_exists(step_name);
    let condition: SkipCondition<T> = Arc::new(condition);
    if let Some(step) = self.steps.iter_mut().find(|s| s.name == step_name) {
      step.skip_if = Some(condition);
    }
  }
}
