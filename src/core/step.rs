//! Flow steps.
//!
//! A step is either transactional or non-transactional:
//!
//! - Transactional steps are synchronous and receive the transaction the
//!   orchestrator opened for them. They cannot await anything, so no network
//!   call can happen while database locks are held.
//! - Non-transactional steps are asynchronous and never see a connection.
//!   They read what they need from the context up front and return a future
//!   that owns its inputs.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use rusqlite::Transaction;

use super::context::{ContextValue, FlowValue, ResultContext};
use super::error::FlowError;

/// Outcome of a single step
pub type StepResult = Result<FlowValue, FlowError>;

/// Boxed future returned by a non-transactional step
pub type StepFuture<'a> = Pin<Box<dyn Future<Output = StepResult> + Send + 'a>>;

pub type TransactionalFn<'a> =
    Box<dyn FnOnce(&Transaction<'_>, &ResultContext) -> StepResult + Send + 'a>;

pub type NonTransactionalFn<'a> = Box<dyn FnOnce(&ResultContext) -> StepFuture<'a> + Send + 'a>;

/// Kind of work a step performs
pub enum StepKind<'a> {
    /// Runs inside its own transaction
    Transactional(TransactionalFn<'a>),

    /// Runs with no transaction open
    NonTransactional(NonTransactionalFn<'a>),
}

/// A named unit of work in a flow
pub struct Step<'a> {
    name: String,
    kind: StepKind<'a>,
}

impl<'a> Step<'a> {
    /// Build a step that must run inside a transaction
    pub fn transactional<T, F>(name: impl Into<String>, f: F) -> Self
    where
        T: ContextValue + 'a,
        F: FnOnce(&Transaction<'_>, &ResultContext) -> Result<T, FlowError> + Send + 'a,
    {
        Self {
            name: name.into(),
            kind: StepKind::Transactional(Box::new(
                move |tx: &Transaction<'_>, context: &ResultContext| -> StepResult {
                    f(tx, context).map(T::into_value)
                },
            )),
        }
    }

    /// Build a step that must run outside any transaction
    pub fn non_transactional<T, F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        T: ContextValue + Send + 'a,
        F: FnOnce(&ResultContext) -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, FlowError>> + Send + 'a,
    {
        Self {
            name: name.into(),
            kind: StepKind::NonTransactional(Box::new(
                move |context: &ResultContext| -> StepFuture<'a> {
                    let fut = f(context);
                    Box::pin(async move { fut.await.map(T::into_value) })
                },
            )),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_transactional(&self) -> bool {
        matches!(self.kind, StepKind::Transactional(_))
    }

    pub(crate) fn into_parts(self) -> (String, StepKind<'a>) {
        (self.name, self.kind)
    }
}

impl fmt::Debug for Step<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("transactional", &self.is_transactional())
            .finish()
    }
}
