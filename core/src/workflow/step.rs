// openmarket/src/workflow/step.rs

use std::sync::Arc;

/// Evaluated against the run's data before a step starts; `true` skips it.
pub type SkipCondition<T> = Arc<dyn Fn(&T) -> bool + Send + Sync + 'static>;

/// A named step, its optionality and its skip condition.
#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
