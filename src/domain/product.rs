//! Products: purchasable payment links.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::links::Link;
use super::UnknownStatus;

/// A product that payments can be created against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Database identifier (set once persisted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Externally visible identifier
    pub external_id: String,

    /// Gateway account the product belongs to
    pub gateway_account_id: i64,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Price in minor units (pence)
    pub price: i64,

    /// Token used to authenticate against the payments API
    pub pay_api_token: String,

    /// Where the payer is sent after paying
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,

    pub status: ProductStatus,

    pub date_created: DateTime<Utc>,

    /// Presentation links, never persisted
    #[serde(rename = "_links", default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl Product {
    /// Create a new, not yet persisted, active product
    pub fn new(
        gateway_account_id: i64,
        external_id: String,
        name: String,
        price: i64,
        pay_api_token: String,
    ) -> Self {
        Self {
            id: None,
            external_id,
            gateway_account_id,
            name,
            description: None,
            price,
            pay_api_token,
            return_url: None,
            status: ProductStatus::Active,
            date_created: Utc::now(),
            links: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_return_url(mut self, return_url: impl Into<String>) -> Self {
        self.return_url = Some(return_url.into());
        self
    }
}

/// Lifecycle of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
