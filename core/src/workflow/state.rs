// openmarket/src/workflow/state.rs

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Shared, lockable data handed to every step handler of a pipeline run.
///
/// Cloning is cheap (an `Arc` bump) and every clone sees the same data, which
/// is how a handler hands results to the steps that follow it.
///
/// IMPORTANT: guards are blocking and MUST be dropped before any `.await`.
#[derive(Debug)]
pub struct FlowState<T: Send + Sync + 'static>(Arc<RwLock<T>>);

impl<T: Send + Sync + 'static> FlowState<T> {
  pub fn new(data: T) -> Self {
    FlowState(Arc::new(RwLock::new(data)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, T> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.0.write()
  }

  /// Replaces the whole value, returning the previous one.
  pub fn replace(&self, data: T) -> T {
    std::mem::replace(&mut *self.0.write(), data)
  }
}

impl<T: Send + Sync + Clone + 'static> FlowState<T> {
  /// Clones the current value out from under a short read lock.
  pub fn snapshot(&self) -> T {
    self.0.read().clone()
  }
}

impl<T: Send + Sync + 'static> Clone for FlowState<T> {
  fn clone(&self) -> Self {
    FlowState(Arc::clone(&self.0))
  }
}

impl<T: Send + Sync + Default + 'static> Default for FlowState<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}
