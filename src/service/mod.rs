//! Business operations built on the transaction flow.
//!
//! - PaymentCreator: Creates a payment for a product through the gateway
//! - ProductCreator: Persists new products
//! - ProductFinder: Product lookups, updates, disabling and deletion
//! - ProductMetadataService: Key-value pairs attached to products
//! - PaymentFinder: Payment lookups

pub mod payment_creator;
pub mod payment_finder;
pub mod product_creator;
pub mod product_finder;
pub mod product_metadata;

use thiserror::Error;

use crate::adapters::GatewayError;
use crate::core::{ContextValue, FlowError, Step, TransactionFlow};
use crate::domain::ValidationError;
use crate::store::Database;

pub use payment_creator::PaymentCreator;
pub use payment_finder::PaymentFinder;
pub use product_creator::{NewProduct, ProductCreator};
pub use product_finder::ProductFinder;
pub use product_metadata::ProductMetadataService;

/// Errors surfaced to callers of the business operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The payments API did not create the payment
    #[error("Payment creation failed downstream for product {product_id}")]
    Downstream { product_id: i64 },

    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// A direct payments API call failed
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Flow failed: {0}")]
    Flow(FlowError),
}

impl From<FlowError> for ServiceError {
    fn from(error: FlowError) -> Self {
        match error {
            FlowError::NotFound { entity, id } => Self::NotFound { entity, id },
            FlowError::Transaction(e) => Self::Store(e),
            FlowError::Validation(e) => Self::Validation(e),
            other => Self::Flow(other),
        }
    }
}

impl ServiceError {
    /// HTTP status a request handler should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) => 400,
            Self::Downstream { .. } | Self::Gateway(_) | Self::Store(_) | Self::Flow(_) => 500,
        }
    }
}

/// Run a one-step flow on a fresh connection. A missing entity comes back
/// as `None`.
pub(crate) async fn run_single_step<T: ContextValue>(
    database: &Database,
    step: Step<'static>,
) -> Result<Option<T>, ServiceError> {
    let conn = database.connect()?;
    let result = TransactionFlow::new(conn)
        .append(step)
        .run()
        .await
        .into_result::<T>();

    match result {
        Ok(value) => Ok(Some(value)),
        Err(FlowError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ValueKind;

    #[test]
    fn test_flow_errors_map_to_service_errors() {
        let not_found: ServiceError = FlowError::not_found("product", 99).into();
        assert!(matches!(
            not_found,
            ServiceError::NotFound { entity: "product", ref id } if id == "99"
        ));
        assert_eq!(not_found.http_status(), 404);

        let store: ServiceError = FlowError::Transaction(rusqlite::Error::QueryReturnedNoRows).into();
        assert!(matches!(store, ServiceError::Store(_)));
        assert_eq!(store.http_status(), 500);

        let missing: ServiceError = FlowError::MissingContextValue(ValueKind::Payment).into();
        assert!(matches!(missing, ServiceError::Flow(_)));
    }

    #[test]
    fn test_validation_is_bad_request() {
        let error: ServiceError = FlowError::from(ValidationError::new("bad")).into();
        assert!(matches!(error, ServiceError::Validation(_)));
        assert_eq!(error.http_status(), 400);
    }

    #[test]
    fn test_downstream_is_server_error() {
        let error = ServiceError::Downstream { product_id: 7 };
        assert_eq!(error.http_status(), 500);
        assert!(error.to_string().contains('7'));
    }
}
