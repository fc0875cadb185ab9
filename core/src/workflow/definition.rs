// openmarket/src/workflow/definition.rs

//! The `Pipeline<T, Err>` struct and its construction.

use crate::workflow::error::{FlowError, FlowResult};
use crate::workflow::hooks::Handler;
use crate::workflow::step::{SkipCondition, StepDef};
use std::collections::HashMap;

/// An ordered list of named steps, each with `on` and `after` handlers that
/// operate on a shared `FlowState<T>` and fail with `Err`.
///
/// `Err` must be `From<FlowError>` so runner failures (a required step with no
/// handler) come back through the same channel as handler failures.
pub struct Pipeline<T, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<T>>,
  pub(crate) on: HashMap<String, Vec<Handler<T, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<T, Err>>>,
}

impl<T, Err> Pipeline<T, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(step_name, optional, skip_if)` triples.
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

  pub fn has_step(&self, step_name: &str) -> bool {
    self.steps.iter().any(|s| s.name == step_name)
  }

  pub fn require_step(&self, step_name: &str) -> FlowResult<()> {
    if self.has_step(step_name) {
      Ok(())
    } else {
      Err(FlowError::StepNotFound {
        pipeline: self.name.clone(),
        step_name: step_name.to_string(),
      })
    }
  }

  /// Panics on an unknown step name: that is a wiring bug, not a runtime
  /// condition.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if let Err(e) = self.require_step(step_name) {
      panic!("Workflow setup error: {}", e);
    }
  }
}
