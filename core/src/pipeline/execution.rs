// storefront-core/src/pipeline/execution.rs

use tracing::{event, info_span, instrument, Instrument, Level};

use super::definition::{Handler, Pipeline};
use super::{ContextData, PipelineControl, PipelineResult};
use crate::error::{ShopError, ShopResult};

impl<T: 'static + Send + Sync> Pipeline<T> {
  /// Runs every step in order against `ctx_data`.
  ///
  /// The first handler error ends the run and is returned as-is. A handler
  /// returning `Stop` ends it with `PipelineResult::Stopped`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(pipeline = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<T>) -> ShopResult<PipelineResult> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_cond) = &step_def.skip_if {
        if skip_cond(ctx_data.clone()) {
          event!(Level::DEBUG, %step_name, "Step skipped by condition.");
          continue;
        }
      }

      let phases: [(&str, Option<&Vec<Handler<T>>>); 3] = [
        ("before", self.before.get(step_name)),
        ("on", self.on.get(step_name)),
        ("after", self.after.get(step_name)),
      ];

      if phases.iter().all(|(_, handlers)| handlers.map_or(true, |h| h.is_empty())) {
        if step_def.optional {
          event!(Level::DEBUG, %step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, %step_name, "Non-optional step has no handlers.");
        return Err(ShopError::HandlerMissing {
          step_name: step_def.name.clone(),
        });
      }

      let step_span = info_span!("pipeline_step", step_name, step_index = step_idx);
      let control = run_phases(&phases, &ctx_data).instrument(step_span).await?;
      if control == PipelineControl::Stop {
        event!(Level::INFO, %step_name, "Pipeline stopped by handler.");
        return Ok(PipelineResult::Stopped);
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }
}

async fn run_phases<T: 'static + Send + Sync>(
  phases: &[(&str, Option<&Vec<Handler<T>>>)],
  ctx_data: &ContextData<T>,
) -> ShopResult<PipelineControl> {
  for (phase, handlers) in phases {
    let Some(handlers) = handlers else { continue };
    for handler_fn in handlers.iter() {
      match handler_fn(ctx_data.clone()).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => return Ok(PipelineControl::Stop),
        Err(e) => {
          if e.is_client_error() {
            event!(Level::DEBUG, %phase, error = %e, "Handler rejected request.");
          } else {
            event!(Level::ERROR, %phase, error = %e, "Handler failed.");
          }
          return Err(e);
        }
      }
    }
  }
  Ok(PipelineControl::Continue)
}
