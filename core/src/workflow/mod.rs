// openmarket/src/workflow/mod.rs

//! A small ordered-step pipeline runner.
//!
//! Every marketplace action that takes more than one contract round trip
//! (adding to the cart, checking out, moving an order along) is declared as a
//! `Pipeline<T, Err>` of named steps. Handlers share a `FlowState<T>`, may stop
//! the run early with `StepControl::Stop`, and each step gets its own tracing
//! span.

pub mod control;
pub mod definition;
pub mod error;
pub mod execution;
pub mod hooks;
pub mod state;
pub mod step;

pub use control::{FlowOutcome, StepControl};
pub use definition::Pipeline;
pub use error::{FlowError, FlowResult};
pub use hooks::Handler;
pub use state::FlowState;
pub use step::{SkipCondition, StepDef};
