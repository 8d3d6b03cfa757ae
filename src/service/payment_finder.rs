//! Payment lookups.

use tracing::{info, instrument};

use crate::adapters::{PaymentGateway, PaymentResponse};
use crate::domain::{LinksDecorator, Payment};
use crate::store::{Database, PaymentDao};

use super::ServiceError;

pub struct PaymentFinder {
    database: Database,
    links: LinksDecorator,
}

impl PaymentFinder {
    pub fn new(database: Database, links: LinksDecorator) -> Self {
        Self { database, links }
    }

    /// Find a payment by its external id, with links attached
    #[instrument(skip(self))]
    pub fn find_by_external_id(&self, external_id: &str) -> Result<Option<Payment>, ServiceError> {
        let conn = self.database.connect()?;
        let payment = PaymentDao::find_by_external_id(&conn, external_id)?;
        Ok(payment.map(|p| self.links.decorate_payment(p)))
    }

    /// Ask the payments API for its view of a stored payment, using the
    /// product's token. `None` when we never got a payment id for it or the
    /// API no longer knows it.
    #[instrument(skip(self, gateway), fields(gateway = gateway.name()))]
    pub async fn fetch_from_gateway(
        &self,
        gateway: &dyn PaymentGateway,
        external_id: &str,
    ) -> Result<Option<PaymentResponse>, ServiceError> {
        let payment = {
            let conn = self.database.connect()?;
            PaymentDao::find_by_external_id(&conn, external_id)?
        };

        let Some(payment) = payment else {
            return Ok(None);
        };
        let Some(govuk_payment_id) = payment.govuk_payment_id.as_deref() else {
            info!(external_id, status = %payment.status, "Payment has no payments API id");
            return Ok(None);
        };

        let response = gateway
            .find_payment(&payment.product.pay_api_token, govuk_payment_id)
            .await?;
        Ok(response)
    }
}
