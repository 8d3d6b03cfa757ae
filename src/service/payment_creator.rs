//! Payment creation.
//!
//! Creating a payment runs three steps:
//! 1. `before_payment_creation` (transactional): load the product and record
//!    a `CREATED` payment attempt, so the attempt is durable even if the
//!    gateway never answers.
//! 2. `payment_creation` (non-transactional): call the payments API. Any
//!    gateway error becomes an `ERROR` status instead of a step failure.
//! 3. `after_payment_creation` (transactional): store the final status.
//!
//! A payment left in `ERROR` is reported as [`ServiceError::Downstream`].

use std::sync::Arc;

use rusqlite::Transaction;
use tracing::{error, info, instrument};

use crate::adapters::{PaymentGateway, PaymentRequest};
use crate::core::{FlowError, ResultContext, Step, TransactionFlow};
use crate::domain::{LinksDecorator, Payment};
use crate::ids::IdGenerator;
use crate::store::{Database, PaymentDao, ProductDao};

use super::ServiceError;

/// Creates payments for products
pub struct PaymentCreator {
    database: Database,
    gateway: Arc<dyn PaymentGateway>,
    ids: Arc<dyn IdGenerator>,
    links: LinksDecorator,
}

impl PaymentCreator {
    pub fn new(
        database: Database,
        gateway: Arc<dyn PaymentGateway>,
        ids: Arc<dyn IdGenerator>,
        links: LinksDecorator,
    ) -> Self {
        Self {
            database,
            gateway,
            ids,
            links,
        }
    }

    /// Create a payment for the product with the given id
    #[instrument(skip(self), fields(gateway = self.gateway.name()))]
    pub async fn create(&self, product_id: i64) -> Result<Payment, ServiceError> {
        let conn = self.database.connect()?;

        let payment: Payment = TransactionFlow::new(conn)
            .append(self.before_payment_creation(product_id))
            .append(self.payment_creation())
            .append(self.after_payment_creation())
            .run()
            .await
            .into_result()?;

        if payment.is_failed() {
            return Err(ServiceError::Downstream { product_id });
        }

        Ok(self.links.decorate_payment(payment))
    }

    fn before_payment_creation(&self, product_id: i64) -> Step<'static> {
        let ids = Arc::clone(&self.ids);

        Step::transactional(
            "before_payment_creation",
            move |tx: &Transaction<'_>, _context: &ResultContext| {
                info!(product_id, "Creating a new payment");

                let product = ProductDao::find_by_id(tx, product_id)?
                    .ok_or_else(|| FlowError::not_found("product", product_id))?;

                let mut payment = Payment::new(ids.random_id(), product);
                PaymentDao::persist(tx, &mut payment)?;
                Ok(payment)
            },
        )
    }

    fn payment_creation(&self) -> Step<'static> {
        let gateway = Arc::clone(&self.gateway);

        Step::non_transactional("payment_creation", move |context: &ResultContext| {
            let payment = context.get::<Payment>().cloned();

            async move {
                let mut payment = payment?;
                let request = PaymentRequest::for_product(&payment.product);

                let result = gateway
                    .create_payment(&payment.product.pay_api_token, &request)
                    .await;

                match result {
                    Ok(response) => {
                        info!(
                            product_id = ?payment.product.id,
                            payment_id = %payment.external_id,
                            govuk_payment_id = %response.payment_id,
                            "Payment creation successful"
                        );
                        let next_url = response.next_url();
                        payment.mark_succeeded(response.payment_id, next_url);
                    }
                    Err(e) => {
                        error!(
                            product_id = ?payment.product.id,
                            payment_id = %payment.external_id,
                            transport = e.is_transport(),
                            error = %e,
                            "Payment creation failed"
                        );
                        payment.mark_failed();
                    }
                }

                Ok::<_, FlowError>(payment)
            }
        })
    }

    fn after_payment_creation(&self) -> Step<'static> {
        Step::transactional(
            "after_payment_creation",
            |tx: &Transaction<'_>, context: &ResultContext| {
                let payment = context.get::<Payment>()?.clone();
                PaymentDao::merge(tx, &payment)?;

                info!(
                    product_id = ?payment.product.id,
                    payment_id = %payment.external_id,
                    status = %payment.status,
                    "Payment creation completed"
                );
                Ok(payment)
            },
        )
    }
}
