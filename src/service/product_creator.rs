//! Product creation.

use std::sync::Arc;

use rusqlite::Transaction;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::core::{ResultContext, Step, TransactionFlow};
use crate::domain::{LinksDecorator, Product, ValidationError};
use crate::ids::IdGenerator;
use crate::store::{Database, ProductDao};

use super::ServiceError;

/// Input for a new product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub gateway_account_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in minor units (pence)
    pub price: i64,
    pub pay_api_token: String,
    #[serde(default)]
    pub return_url: Option<String>,
}

impl NewProduct {
    /// Check every mandatory field, reporting all problems at once
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut messages = Vec::new();

        if self.gateway_account_id <= 0 {
            messages.push("Field [gateway_account_id] must be a positive number".to_string());
        }
        if self.name.trim().is_empty() {
            messages.push("Field [name] is required".to_string());
        }
        if self.pay_api_token.trim().is_empty() {
            messages.push("Field [pay_api_token] is required".to_string());
        }
        if self.price <= 0 {
            messages.push("Field [price] must be a positive amount in pence".to_string());
        }
        if let Some(url) = &self.return_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                messages.push("Field [return_url] must be an http(s) URL".to_string());
            }
        }

        ValidationError::check(messages)
    }

    fn into_product(self, external_id: String) -> Product {
        let mut product = Product::new(
            self.gateway_account_id,
            external_id,
            self.name,
            self.price,
            self.pay_api_token,
        );
        product.description = self.description;
        product.return_url = self.return_url;
        product
    }
}

pub struct ProductCreator {
    database: Database,
    ids: Arc<dyn IdGenerator>,
    links: LinksDecorator,
}

impl ProductCreator {
    pub fn new(database: Database, ids: Arc<dyn IdGenerator>, links: LinksDecorator) -> Self {
        Self {
            database,
            ids,
            links,
        }
    }

    /// Persist a new active product and return it with links attached
    #[instrument(skip(self, new_product), fields(gateway_account_id = new_product.gateway_account_id))]
    pub async fn create(&self, new_product: NewProduct) -> Result<Product, ServiceError> {
        new_product.validate()?;

        let conn = self.database.connect()?;
        let external_id = self.ids.random_id();

        let step = Step::transactional(
            "create_product",
            move |tx: &Transaction<'_>, _context: &ResultContext| {
                let mut product = new_product.into_product(external_id);
                ProductDao::persist(tx, &mut product)?;
                info!(
                    product_id = ?product.id,
                    external_id = %product.external_id,
                    "Product created"
                );
                Ok(product)
            },
        );

        let product: Product = TransactionFlow::new(conn)
            .append(step)
            .run()
            .await
            .into_result()?;

        Ok(self.links.decorate_product(product))
    }
}
