// openmarket/src/workflow/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Failures raised by the pipeline runner itself rather than by a step's
/// business logic.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found in pipeline '{pipeline}': {step_name}")]
  StepNotFound { pipeline: String, step_name: String },

  #[error("Handler missing for non-optional step '{step_name}' in pipeline '{pipeline}'")]
  HandlerMissing { pipeline: String, step_name: String },

  #[error("Step handler failed. Source: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal workflow error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::Handler { source: err }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
