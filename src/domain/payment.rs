//! Payments created against a product.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::links::Link;
use super::product::Product;
use super::UnknownStatus;

/// A payment attempt for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Database identifier (set once persisted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Externally visible identifier
    pub external_id: String,

    /// Identifier issued by the payments API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub govuk_payment_id: Option<String>,

    /// Where to send the payer next; empty when the API gave none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,

    pub status: PaymentStatus,

    /// The product this payment was created for
    pub product: Product,

    pub date_created: DateTime<Utc>,

    /// Presentation links, never persisted
    #[serde(rename = "_links", default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl Payment {
    /// Create a new payment attempt in the `Created` state
    pub fn new(external_id: String, product: Product) -> Self {
        Self {
            id: None,
            external_id,
            govuk_payment_id: None,
            next_url: None,
            status: PaymentStatus::Created,
            product,
            date_created: Utc::now(),
            links: Vec::new(),
        }
    }

    /// Record a successful gateway response
    pub fn mark_succeeded(&mut self, govuk_payment_id: String, next_url: String) {
        self.govuk_payment_id = Some(govuk_payment_id);
        self.next_url = Some(next_url);
        self.status = PaymentStatus::Succeeded;
    }

    /// Record a failed gateway call
    pub fn mark_failed(&mut self) {
        self.status = PaymentStatus::Failed;
    }

    pub fn is_failed(&self) -> bool {
        self.status == PaymentStatus::Failed
    }
}

/// Domain status of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "CREATED")]
    Created,

    #[serde(rename = "IN_PROGRESS")]
    InProgress,

    #[serde(rename = "SUCCESS")]
    Succeeded,

    #[serde(rename = "ERROR")]
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::InProgress => "IN_PROGRESS",
            Self::Succeeded => "SUCCESS",
            Self::Failed => "ERROR",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(Self::Created),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "SUCCESS" => Ok(Self::Succeeded),
            "ERROR" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product::new(1, "P1".to_string(), "Fee".to_string(), 1050, "token".to_string())
    }

    #[test]
    fn test_new_payment_is_created() {
        let payment = Payment::new("abc".to_string(), product());

        assert_eq!(payment.status, PaymentStatus::Created);
        assert!(payment.govuk_payment_id.is_none());
        assert!(payment.next_url.is_none());
    }

    #[test]
    fn test_mark_succeeded_records_gateway_fields() {
        let mut payment = Payment::new("abc".to_string(), product());
        payment.mark_succeeded("G1".to_string(), String::new());

        assert_eq!(payment.status, PaymentStatus::Succeeded);
        assert_eq!(payment.govuk_payment_id.as_deref(), Some("G1"));
        assert_eq!(payment.next_url.as_deref(), Some(""));
    }

    #[test]
    fn test_status_serializes_as_wire_names() {
        let json = serde_json::to_string(&PaymentStatus::Failed).unwrap();
        assert_eq!(json, "\"ERROR\"");
        assert_eq!("SUCCESS".parse::<PaymentStatus>().unwrap(), PaymentStatus::Succeeded);
        assert!("PENDING".parse::<PaymentStatus>().is_err());
    }
}
