// openmarket/src/workflow/execution.rs

//! `Pipeline::run()`: executes the steps in order against one `FlowState<T>`.

use crate::workflow::control::{FlowOutcome, StepControl};
use crate::workflow::definition::Pipeline;
use crate::workflow::error::FlowError;
use crate::workflow::hooks::Handler;
use crate::workflow::state::FlowState;
use tracing::{event, instrument, span, Instrument, Level};

enum PhaseResult<Err> {
  Continue,
  Stop,
  Failed(Err),
}

impl<T, Err> Pipeline<T, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in declaration order.
  ///
  /// A step whose `skip_if` holds is skipped. An optional step without
  /// handlers is skipped; a required one fails with `FlowError::HandlerMissing`.
  /// The first handler error aborts the run and is returned as is.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(pipeline = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, state: FlowState<T>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if let Some(skip_cond) = &step_def.skip_if {
        let skip = {
          let guard = state.read();
          skip_cond(&guard)
        };
        if skip {
          event!(parent: &step_span, Level::INFO, "Step skipped due to 'skip_if' condition.");
          continue;
        }
      }

      let on_handlers = self.on.get(step_name).filter(|v| !v.is_empty());
      let after_handlers = self.after.get(step_name).filter(|v| !v.is_empty());

      if on_handlers.is_none() && after_handlers.is_none() {
        if step_def.optional {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          pipeline: self.name.clone(),
          step_name: step_def.name.clone(),
        }));
      }

      for (phase, handlers) in [("on", on_handlers), ("after", after_handlers)] {
        let Some(handlers) = handlers else { continue };
        match run_phase(handlers, &state, phase).instrument(step_span.clone()).await {
          PhaseResult::Continue => {}
          PhaseResult::Stop => {
            event!(parent: &step_span, Level::INFO, phase, "Pipeline stopped by a handler.");
            return Ok(FlowOutcome::Stopped);
          }
          PhaseResult::Failed(e) => return Err(e),
        }
      }
      event!(parent: &step_span, Level::DEBUG, "Step finished.");
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(FlowOutcome::Completed)
  }
}

async fn run_phase<T, Err>(handlers: &[Handler<T, Err>], state: &FlowState<T>, phase: &'static str) -> PhaseResult<Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    match handler_fn(state.clone()).await {
      Ok(StepControl::Continue) => {}
      Ok(StepControl::Stop) => return PhaseResult::Stop,
      Err(e) => {
        event!(Level::ERROR, phase, handler_index = handler_idx, error = %e, "Step handler failed.");
        return PhaseResult::Failed(e);
      }
    }
  }
  PhaseResult::Continue
}
