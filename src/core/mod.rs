//! Core orchestration logic.
//!
//! This module contains:
//! - ResultContext: Typed relay of values between steps
//! - Step: Transactional and non-transactional units of work
//! - TransactionFlow: Runs steps with per-step transaction demarcation

pub mod context;
pub mod error;
pub mod orchestrator;
pub mod step;

// Re-export commonly used types
pub use context::{ContextValue, FlowValue, ResultContext, ValueKind};
pub use error::FlowError;
pub use orchestrator::{FlowOutcome, FlowRun, TransactionFlow};
pub use step::{Step, StepKind, StepResult};
