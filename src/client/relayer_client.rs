//! HTTP client for the FlowShield relayer service.
//!
//! Endpoints:
//! - POST /api/resolver
//! - GET /api/health

use std::time::Duration;

use super::{ClientError, ClientResult};
use crate::api::{HealthResponse, RelayerRequest, RelayerResponse};

pub struct RelayerClient {
    base_url: String,
    client: reqwest::Client,
}

impl RelayerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the relayer to withdraw on our behalf.
    ///
    /// A rejection carrying an `error` message becomes
    /// [`ClientError::Relayer`] with that message.
    pub async fn withdraw(&self, request: &RelayerRequest) -> ClientResult<RelayerResponse> {
        let url = format!("{}/api/resolver", self.base_url);

        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::RelayerTransport(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let parsed: Option<RelayerResponse> = serde_json::from_str(&body).ok();

        match parsed {
            Some(response) if status.is_success() && response.success => Ok(response),
            Some(RelayerResponse {
                error: Some(message),
                ..
            }) => Err(ClientError::Relayer(message)),
            _ => Err(ClientError::RelayerTransport(format!(
                "relayer returned status {}: {}",
                status, body
            ))),
        }
    }

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        let url = format!("{}/api/health", self.base_url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::RelayerTransport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ClientError::RelayerTransport(format!(
                "relayer returned status {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| ClientError::RelayerTransport(format!("failed to parse relayer response: {}", e)))
    }
}
