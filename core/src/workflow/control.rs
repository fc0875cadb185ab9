// openmarket/src/workflow/control.rs

//! Signals for controlling pipeline flow and the outcome of a pipeline run.

/// Returned by a step handler to say whether the pipeline should go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Run the remaining handlers of this step and the steps after it.
  Continue,
  /// Halt the pipeline now. Nothing after this handler runs.
  Stop,
}

/// Outcome of a full pipeline run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  Completed,
  /// A handler returned `StepControl::Stop`.
  Stopped,
}
