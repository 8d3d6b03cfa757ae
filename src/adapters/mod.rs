//! Adapter interfaces for external systems.
//!
//! The payments API is the only downstream collaborator. Flows talk to it
//! through the [`PaymentGateway`] trait so tests can substitute their own.

pub mod public_api;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Product;

// Re-export the HTTP client
pub use public_api::PublicApiClient;

/// Errors from a payment gateway call
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The API answered with a non-success status
    #[error("Payments API rejected the request ({status}): {}", .description.as_deref().unwrap_or("no description"))]
    Rejected {
        status: u16,
        code: Option<String>,
        description: Option<String>,
    },

    /// The API could not be reached
    #[error("Payments API unreachable: {0}")]
    Transport(String),

    /// The API answered successfully with a body we could not read
    #[error("Invalid response from payments API: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Body of a create-payment call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount in minor units
    pub amount: i64,

    /// Our reference for the payment (the product external id)
    pub reference: String,

    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

impl PaymentRequest {
    /// Build the request for paying a product's full price
    pub fn for_product(product: &Product) -> Self {
        Self {
            amount: product.price,
            reference: product.external_id.clone(),
            description: product
                .description
                .clone()
                .unwrap_or_else(|| product.name.clone()),
            return_url: product.return_url.clone(),
        }
    }
}

/// Response of a create-payment call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub payment_id: String,

    #[serde(default)]
    pub amount: Option<i64>,

    #[serde(default)]
    pub reference: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub return_url: Option<String>,

    #[serde(rename = "_links", default)]
    pub links: Option<PaymentLinks>,
}

impl PaymentResponse {
    /// Where to send the payer next, or an empty string when absent
    pub fn next_url(&self) -> String {
        self.links
            .as_ref()
            .and_then(|links| links.next_url.as_ref())
            .map(|link| link.href.clone())
            .unwrap_or_default()
    }
}

/// Links section of a payment response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLinks {
    #[serde(default)]
    pub next_url: Option<ResponseLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseLink {
    pub href: String,

    #[serde(default)]
    pub method: Option<String>,
}

/// Trait for payment gateways
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Human-readable gateway name
    fn name(&self) -> &str;

    /// Create a payment, authenticating with the product's API token
    async fn create_payment(
        &self,
        api_token: &str,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, GatewayError>;

    /// Look up a payment by the id the API issued. `None` when the API does
    /// not know it.
    async fn find_payment(
        &self,
        api_token: &str,
        payment_id: &str,
    ) -> Result<Option<PaymentResponse>, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_for_product() {
        let product = Product::new(1, "P1".to_string(), "Fee".to_string(), 1050, "t".to_string())
            .with_return_url("https://return.url");

        let request = PaymentRequest::for_product(&product);
        assert_eq!(request.amount, 1050);
        assert_eq!(request.reference, "P1");
        assert_eq!(request.description, "Fee");
        assert_eq!(request.return_url.as_deref(), Some("https://return.url"));
    }

    #[test]
    fn test_next_url_from_response() {
        let json = r#"{
            "payment_id": "G1",
            "amount": 1050,
            "_links": { "next_url": { "href": "https://next.url", "method": "GET" } }
        }"#;
        let response: PaymentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.next_url(), "https://next.url");
    }

    #[test]
    fn test_missing_next_url_is_empty() {
        let response: PaymentResponse = serde_json::from_str(r#"{"payment_id": "G1"}"#).unwrap();
        assert_eq!(response.next_url(), "");

        let response: PaymentResponse =
            serde_json::from_str(r#"{"payment_id": "G1", "_links": {}}"#).unwrap();
        assert_eq!(response.next_url(), "");
    }

    #[test]
    fn test_error_classification() {
        let rejected = GatewayError::Rejected {
            status: 400,
            code: Some("P0102".to_string()),
            description: None,
        };
        assert!(!rejected.is_transport());
        assert!(rejected.to_string().contains("(400)"));
        assert!(rejected.to_string().contains("no description"));

        assert!(GatewayError::Transport("refused".to_string()).is_transport());
    }
}
