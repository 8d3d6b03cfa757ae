//! Per-product payment usage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::Product;

/// How often a product has been paid for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductUsageStat {
    pub payment_count: i64,
    pub last_payment_date: DateTime<Utc>,
    pub product: Product,
}
