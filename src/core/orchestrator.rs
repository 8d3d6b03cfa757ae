//! Transaction-flow orchestrator.
//!
//! Executes an ordered list of steps over a shared [`ResultContext`]. Every
//! transactional step gets a fresh transaction that is committed or rolled
//! back before the next step starts; non-transactional steps run with no
//! transaction open. The first failing step halts the flow.

use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, error, info, instrument, warn};

use super::context::{ContextValue, ResultContext};
use super::error::FlowError;
use super::step::{Step, StepKind, StepResult, TransactionalFn};

/// Builder and runner for a single flow
pub struct TransactionFlow<'a> {
    /// Connection owned by this flow for its whole run
    conn: Connection,

    /// Steps in execution order
    steps: Vec<Step<'a>>,
}

impl<'a> TransactionFlow<'a> {
    /// Create an empty flow over a dedicated connection
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            steps: Vec::new(),
        }
    }

    /// Add a step to the end of the flow
    pub fn append(mut self, step: Step<'a>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Execute all steps in order.
    ///
    /// Never fails itself: a failing step is recorded as the run's terminal
    /// outcome and the remaining steps are skipped.
    #[instrument(skip(self), fields(steps = self.steps.len()))]
    pub async fn run(self) -> FlowRun {
        let Self { mut conn, steps } = self;
        let mut context = ResultContext::new();
        let mut executed = 0;

        for (index, step) in steps.into_iter().enumerate() {
            let (name, kind) = step.into_parts();
            debug!(step = %name, index, "Executing step");

            let result = match kind {
                StepKind::Transactional(work) => {
                    execute_in_transaction(&mut conn, &name, work, &context)
                }
                StepKind::NonTransactional(work) => work(&context).await,
            };
            executed += 1;

            match result {
                Ok(value) => context.store_value(value),
                Err(error) => {
                    error!(step = %name, index, %error, "Step failed, halting flow");
                    return FlowRun {
                        context,
                        outcome: FlowOutcome::Halted {
                            step: name,
                            index,
                            error,
                        },
                        executed,
                    };
                }
            }
        }

        info!(executed, "Flow completed");
        FlowRun {
            context,
            outcome: FlowOutcome::Completed,
            executed,
        }
    }
}

/// Run one transactional step inside its own transaction.
///
/// The transaction is committed only when the step succeeds; a failed commit
/// is reported as the step's failure.
fn execute_in_transaction(
    conn: &mut Connection,
    name: &str,
    work: TransactionalFn<'_>,
    context: &ResultContext,
) -> StepResult {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    match work(&tx, context) {
        Ok(value) => {
            tx.commit()?;
            debug!(step = name, "Transaction committed");
            Ok(value)
        }
        Err(error) => {
            match tx.rollback() {
                Ok(()) => debug!(step = name, "Transaction rolled back"),
                Err(rollback_error) => {
                    warn!(step = name, error = %rollback_error, "Rollback failed")
                }
            }
            Err(error)
        }
    }
}

/// Terminal outcome of a flow run
#[derive(Debug)]
pub enum FlowOutcome {
    /// Every step returned normally
    Completed,

    /// A step failed and the remaining steps were skipped
    Halted {
        step: String,
        index: usize,
        error: FlowError,
    },
}

/// A finished flow run: its context and how it ended
#[derive(Debug)]
pub struct FlowRun {
    context: ResultContext,
    outcome: FlowOutcome,
    executed: usize,
}

impl FlowRun {
    pub fn outcome(&self) -> &FlowOutcome {
        &self.outcome
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, FlowOutcome::Completed)
    }

    /// The error that halted the run, if any
    pub fn failure(&self) -> Option<&FlowError> {
        match &self.outcome {
            FlowOutcome::Completed => None,
            FlowOutcome::Halted { error, .. } => Some(error),
        }
    }

    /// Name of the step that halted the run, if any
    pub fn halted_step(&self) -> Option<&str> {
        match &self.outcome {
            FlowOutcome::Completed => None,
            FlowOutcome::Halted { step, .. } => Some(step),
        }
    }

    /// Number of steps that were started, including a failed one
    pub fn steps_executed(&self) -> usize {
        self.executed
    }

    pub fn context(&self) -> &ResultContext {
        &self.context
    }

    /// Latest stored value of type `T`, whether or not the run completed
    pub fn result<T: ContextValue>(&self) -> Result<&T, FlowError> {
        self.context.get()
    }

    /// The final value of type `T`, or the error that halted the run
    pub fn into_result<T: ContextValue>(self) -> Result<T, FlowError> {
        let FlowRun {
            mut context,
            outcome,
            ..
        } = self;

        match outcome {
            FlowOutcome::Completed => context.take(),
            FlowOutcome::Halted { error, .. } => Err(error),
        }
    }
}
