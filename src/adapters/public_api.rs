//! HTTP client for the public payments API.
//!
//! Endpoints:
//! - POST {base_url}/v1/payments
//! - GET  {base_url}/v1/payments/{payment_id}
//!
//! Auth: Bearer token (the product's API token)

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{GatewayError, PaymentGateway, PaymentRequest, PaymentResponse};

/// Public payments API client
pub struct PublicApiClient {
    base_url: String,
    client: reqwest::Client,
}

/// Error body returned by the API on rejection
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl PublicApiClient {
    /// Create a client with a request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create from the resolved configuration
    pub fn from_config(config: &crate::config::ResolvedConfig) -> Result<Self> {
        Self::new(
            config.public_api.url.clone(),
            Duration::from_secs(config.public_api.timeout_seconds),
        )
    }

    fn payments_url(&self) -> String {
        format!("{}/v1/payments", self.base_url)
    }

    fn payment_url(&self, payment_id: &str) -> String {
        format!("{}/{}", self.payments_url(), payment_id)
    }
}

/// Read a 2xx body as a payment
async fn parse_payment(response: reqwest::Response) -> Result<PaymentResponse, GatewayError> {
    response
        .json::<PaymentResponse>()
        .await
        .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
}

/// Classify a non-2xx response. The body is `{code, description}` when the
/// API produced it, otherwise raw text or nothing.
async fn rejection(status: StatusCode, response: reqwest::Response) -> GatewayError {
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            debug!(status = status.as_u16(), error = %e, "Failed to read error body");
            String::new()
        }
    };

    let body: Option<ErrorBody> = serde_json::from_str(&text).ok();
    let (code, description) = match body {
        Some(body) => (body.code, body.description),
        None if text.is_empty() => (None, None),
        None => (None, Some(text)),
    };

    GatewayError::Rejected {
        status: status.as_u16(),
        code,
        description,
    }
}

#[async_trait]
impl PaymentGateway for PublicApiClient {
    fn name(&self) -> &str {
        "public-api"
    }

    async fn create_payment(
        &self,
        api_token: &str,
        request: &PaymentRequest,
    ) -> Result<PaymentResponse, GatewayError> {
        let url = self.payments_url();
        debug!(%url, reference = %request.reference, "Creating payment");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_token)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return parse_payment(response).await;
        }

        Err(rejection(status, response).await)
    }

    async fn find_payment(
        &self,
        api_token: &str,
        payment_id: &str,
    ) -> Result<Option<PaymentResponse>, GatewayError> {
        let url = self.payment_url(payment_id);
        debug!(%url, "Finding payment");

        let response = self
            .client
            .get(&url)
            .bearer_auth(api_token)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status.is_success() {
            return parse_payment(response).await.map(Some);
        }

        Err(rejection(status, response).await)
    }
}
