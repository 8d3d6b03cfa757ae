//! Failures a flow step can report.

use thiserror::Error;

use crate::adapters::GatewayError;
use crate::domain::ValidationError;

use super::context::ValueKind;

/// Why a step failed and halted its flow run
#[derive(Debug, Error)]
pub enum FlowError {
    /// A step asked for a value no earlier step produced
    #[error("No {0} value was stored by an earlier step")]
    MissingContextValue(ValueKind),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The store rejected the step's work or its commit
    #[error("Transaction failed: {0}")]
    Transaction(#[from] rusqlite::Error),

    #[error("Downstream call failed: {0}")]
    Downstream(#[from] GatewayError),

    /// The step's input broke a business rule
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),
}

impl FlowError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
