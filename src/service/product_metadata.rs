//! Product metadata operations.

use rusqlite::Transaction;
use serde_json::Value;
use tracing::{info, instrument};

use crate::core::{FlowError, ResultContext, Step};
use crate::domain::metadata::{check_can_add, check_can_update};
use crate::domain::ProductMetadata;
use crate::store::{Database, ProductDao, ProductMetadataDao};

use super::product_finder::Lookup;
use super::{run_single_step, ServiceError};

pub struct ProductMetadataService {
    database: Database,
}

impl ProductMetadataService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Pairs of a product. `None` when the product does not exist.
    #[instrument(skip(self))]
    pub fn list(&self, external_id: &str) -> Result<Option<Vec<ProductMetadata>>, ServiceError> {
        let conn = self.database.connect()?;
        let Some(product_id) = ProductDao::find_by_external_id(&conn, external_id)?.and_then(|p| p.id)
        else {
            return Ok(None);
        };

        Ok(Some(ProductMetadataDao::find_by_product_id(&conn, product_id)?))
    }

    /// Attach one new pair to a product
    #[instrument(skip(self, payload))]
    pub async fn add(
        &self,
        external_id: &str,
        payload: &Value,
    ) -> Result<Option<ProductMetadata>, ServiceError> {
        let metadata = ProductMetadata::from_payload(payload)?;
        let lookup = Lookup::ExternalId(external_id.to_string());

        let step = Step::transactional(
            "add_product_metadata",
            move |tx: &Transaction<'_>, _context: &ResultContext| {
                let product_id = find_product_id(&lookup, tx)?;
                let existing = ProductMetadataDao::find_by_product_id(tx, product_id)?;
                check_can_add(&existing, &metadata.key)?;
                ProductMetadataDao::persist(tx, product_id, &metadata)?;
                info!(product_id, key = %metadata.key, "Product metadata added");
                Ok(metadata)
            },
        );

        run_single_step(&self.database, step).await
    }

    /// Replace the value of a key the product already has
    #[instrument(skip(self, payload))]
    pub async fn update(
        &self,
        external_id: &str,
        payload: &Value,
    ) -> Result<Option<ProductMetadata>, ServiceError> {
        let metadata = ProductMetadata::from_payload(payload)?;
        let lookup = Lookup::ExternalId(external_id.to_string());

        let step = Step::transactional(
            "update_product_metadata",
            move |tx: &Transaction<'_>, _context: &ResultContext| {
                let product_id = find_product_id(&lookup, tx)?;
                let existing = ProductMetadataDao::find_by_product_id(tx, product_id)?;
                check_can_update(&existing, &metadata.key)?;
                ProductMetadataDao::update(tx, product_id, &metadata)?;
                info!(product_id, key = %metadata.key, "Product metadata updated");
                Ok(metadata)
            },
        );

        run_single_step(&self.database, step).await
    }

    /// Remove a key. Returns whether both the product and the key existed.
    #[instrument(skip(self))]
    pub async fn remove(&self, external_id: &str, key: &str) -> Result<bool, ServiceError> {
        let lookup = Lookup::ExternalId(external_id.to_string());
        let key = key.to_string();

        let step = Step::transactional(
            "remove_product_metadata",
            move |tx: &Transaction<'_>, _context: &ResultContext| {
                let product_id = find_product_id(&lookup, tx)?;
                let existing = ProductMetadataDao::find_by_product_id(tx, product_id)?;
                let removed = existing
                    .into_iter()
                    .find(|m| m.key.eq_ignore_ascii_case(&key))
                    .ok_or_else(|| FlowError::not_found("metadata", &key))?;
                ProductMetadataDao::delete(tx, product_id, &key)?;
                info!(product_id, key = %removed.key, "Product metadata removed");
                Ok(removed)
            },
        );

        let removed = run_single_step::<ProductMetadata>(&self.database, step).await?;
        Ok(removed.is_some())
    }
}

fn find_product_id(lookup: &Lookup, tx: &Transaction<'_>) -> Result<i64, FlowError> {
    let product = lookup.find(tx)?;
    product
        .id
        .ok_or_else(|| FlowError::not_found("product", &product.external_id))
}
