//! Product lookups, updates, disabling and deletion.
//!
//! Writes run as one-step transaction flows. A product that does not exist,
//! or belongs to another gateway account, is reported as `None` (or `false`
//! for deletes) rather than an error.

use rusqlite::{Connection, Transaction};
use tracing::{info, instrument};

use crate::core::{FlowError, ResultContext, Step};
use crate::domain::{
    LinksDecorator, PatchRequest, Product, ProductStatus, ProductUsageStat, ValidationError,
};
use crate::store::{Database, ProductDao};

use super::{run_single_step, ServiceError};

const PAY_API_TOKEN_PATH: &str = "pay_api_token";

/// How a write locates its product
#[derive(Debug, Clone)]
pub(crate) enum Lookup {
    ExternalId(String),
    Scoped {
        gateway_account_id: i64,
        external_id: String,
    },
}

impl Lookup {
    fn scoped(gateway_account_id: i64, external_id: &str) -> Self {
        Self::Scoped {
            gateway_account_id,
            external_id: external_id.to_string(),
        }
    }

    fn external_id(&self) -> &str {
        match self {
            Self::ExternalId(external_id) | Self::Scoped { external_id, .. } => external_id,
        }
    }

    pub(crate) fn find(&self, conn: &Connection) -> Result<Product, FlowError> {
        let product = match self {
            Self::ExternalId(external_id) => ProductDao::find_by_external_id(conn, external_id)?,
            Self::Scoped {
                gateway_account_id,
                external_id,
            } => ProductDao::find_by_gateway_account_id_and_external_id(
                conn,
                *gateway_account_id,
                external_id,
            )?,
        };

        product.ok_or_else(|| FlowError::not_found("product", self.external_id()))
    }
}

pub struct ProductFinder {
    database: Database,
    links: LinksDecorator,
}

impl ProductFinder {
    pub fn new(database: Database, links: LinksDecorator) -> Self {
        Self { database, links }
    }

    #[instrument(skip(self))]
    pub fn find_by_external_id(&self, external_id: &str) -> Result<Option<Product>, ServiceError> {
        let conn = self.database.connect()?;
        let product = ProductDao::find_by_external_id(&conn, external_id)?;
        Ok(product.map(|p| self.links.decorate_product(p)))
    }

    /// Find a product only if it belongs to the gateway account
    #[instrument(skip(self))]
    pub fn find_by_gateway_account_id_and_external_id(
        &self,
        gateway_account_id: i64,
        external_id: &str,
    ) -> Result<Option<Product>, ServiceError> {
        let conn = self.database.connect()?;
        let product = ProductDao::find_by_gateway_account_id_and_external_id(
            &conn,
            gateway_account_id,
            external_id,
        )?;
        Ok(product.map(|p| self.links.decorate_product(p)))
    }

    /// Active products of a gateway account, oldest first
    #[instrument(skip(self))]
    pub fn find_by_gateway_account_id(
        &self,
        gateway_account_id: i64,
    ) -> Result<Vec<Product>, ServiceError> {
        let conn = self.database.connect()?;
        let products = ProductDao::find_by_gateway_account_id(&conn, gateway_account_id)?;
        Ok(products
            .into_iter()
            .map(|p| self.links.decorate_product(p))
            .collect())
    }

    /// Payment counts of products that have been paid for
    #[instrument(skip(self))]
    pub fn usage_stats(
        &self,
        gateway_account_id: Option<i64>,
    ) -> Result<Vec<ProductUsageStat>, ServiceError> {
        let conn = self.database.connect()?;
        let stats = ProductDao::usage_stats(&conn, gateway_account_id)?;
        Ok(stats
            .into_iter()
            .map(|stat| ProductUsageStat {
                product: self.links.decorate_product(stat.product),
                ..stat
            })
            .collect())
    }

    /// Mark a product inactive. Returns `None` when no such product exists.
    pub async fn disable_product(&self, external_id: &str) -> Result<Option<Product>, ServiceError> {
        self.disable(Lookup::ExternalId(external_id.to_string())).await
    }

    /// Mark a product of the gateway account inactive
    pub async fn disable_by_gateway_account_id_and_external_id(
        &self,
        gateway_account_id: i64,
        external_id: &str,
    ) -> Result<Option<Product>, ServiceError> {
        self.disable(Lookup::scoped(gateway_account_id, external_id))
            .await
    }

    /// Delete a product and its metadata. Returns whether it existed.
    pub async fn delete_by_external_id(&self, external_id: &str) -> Result<bool, ServiceError> {
        self.delete(Lookup::ExternalId(external_id.to_string())).await
    }

    pub async fn delete_by_gateway_account_id_and_external_id(
        &self,
        gateway_account_id: i64,
        external_id: &str,
    ) -> Result<bool, ServiceError> {
        self.delete(Lookup::scoped(gateway_account_id, external_id))
            .await
    }

    /// Replace the payments API token of a product
    #[instrument(skip(self, pay_api_token))]
    pub async fn update_pay_api_token_by_external_id(
        &self,
        external_id: &str,
        pay_api_token: &str,
    ) -> Result<Option<Product>, ServiceError> {
        if pay_api_token.trim().is_empty() {
            return Err(ValidationError::new("Field [pay_api_token] is required").into());
        }

        let lookup = Lookup::ExternalId(external_id.to_string());
        let token = pay_api_token.to_string();

        let step = Step::transactional(
            "update_pay_api_token",
            move |tx: &Transaction<'_>, _context: &ResultContext| {
                let mut product = lookup.find(tx)?;
                product.pay_api_token = token;
                ProductDao::merge(tx, &product)?;
                info!(external_id = %product.external_id, "Product API token updated");
                Ok(product)
            },
        );

        let product = run_single_step::<Product>(&self.database, step).await?;
        Ok(product.map(|p| self.links.decorate_product(p)))
    }

    /// Apply a patch operation. Only `replace` of `pay_api_token` is supported.
    pub async fn apply_patch(
        &self,
        external_id: &str,
        patch: &PatchRequest,
    ) -> Result<Option<Product>, ServiceError> {
        if patch.op != "replace" || patch.path != PAY_API_TOKEN_PATH {
            return Err(ValidationError::new(format!(
                "Operation [ {} ] not supported for path [ {} ]",
                patch.op, patch.path
            ))
            .into());
        }

        let token = patch.value_as_str().ok_or_else(|| {
            ValidationError::new(format!("Value for path [ {} ] must be a string", patch.path))
        })?;

        self.update_pay_api_token_by_external_id(external_id, token)
            .await
    }

    #[instrument(skip(self))]
    async fn disable(&self, lookup: Lookup) -> Result<Option<Product>, ServiceError> {
        let step = Step::transactional(
            "disable_product",
            move |tx: &Transaction<'_>, _context: &ResultContext| {
                let mut product = lookup.find(tx)?;
                product.status = ProductStatus::Inactive;
                ProductDao::merge(tx, &product)?;
                info!(external_id = %product.external_id, "Product disabled");
                Ok(product)
            },
        );

        let product = run_single_step::<Product>(&self.database, step).await?;
        Ok(product.map(|p| self.links.decorate_product(p)))
    }

    #[instrument(skip(self))]
    async fn delete(&self, lookup: Lookup) -> Result<bool, ServiceError> {
        let step = Step::transactional(
            "delete_product",
            move |tx: &Transaction<'_>, _context: &ResultContext| {
                let product = lookup.find(tx)?;
                let id = product
                    .id
                    .ok_or_else(|| FlowError::not_found("product", &product.external_id))?;
                ProductDao::delete_by_id(tx, id)?;
                info!(external_id = %product.external_id, "Product deleted");
                Ok(product)
            },
        );

        let deleted = run_single_step::<Product>(&self.database, step).await?;
        Ok(deleted.is_some())
    }
}
