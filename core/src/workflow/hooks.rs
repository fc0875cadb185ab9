// openmarket/src/workflow/hooks.rs

//! Registration of `on` and `after` handlers for pipeline steps.

use crate::workflow::control::StepControl;
use crate::workflow::definition::Pipeline;
use crate::workflow::error::FlowError;
use crate::workflow::state::FlowState;
use std::future::Future;
use std::pin::Pin;

/// A boxed async step handler.
///
/// It receives a clone of the run's `FlowState<T>` and must drop any lock
/// guard before its first `.await`.
pub type Handler<T, Err> = Box<
  dyn Fn(FlowState<T>) -> Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>> + Send + Sync,
>;

impl<T, Err> Pipeline<T, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Registers the main handler(s) of a step. Handlers run in registration
  /// order.
  pub fn on_root<F, UserErr>(&mut self, step_name: &str, handler_fn: impl Fn(FlowState<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = wrap(handler_fn);
    self.on.entry(step_name.to_string()).or_default().push(handler);
  }

  /// Registers a handler that runs after every `on` handler of the step
  /// returned `Continue`.
  pub fn after_root<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(FlowState<T>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = wrap(handler_fn);
    self.after.entry(step_name.to_string()).or_default().push(handler);
  }
}

fn wrap<T, Err, F, UserErr>(handler_fn: impl Fn(FlowState<T>) -> F + Send + Sync + 'static) -> Handler<T, Err>
where
  T: 'static + Send + Sync,
  Err: 'static,
  F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
  UserErr: Into<Err> + Send + Sync + 'static,
{
  Box::new(move |state| {
    let user_fut = handler_fn(state);
    Box::pin(async move { user_fut.await.map_err(Into::into) })
  })
}
