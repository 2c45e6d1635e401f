//! API Request and Response Types
//!
//! Wire shapes of the relayer service. Field names are camelCase to match
//! the browser front-end.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/resolver`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerRequest {
    /// Hex digest of the secret note, without `0x`
    pub secret_hash: String,
    /// Amount in APT
    pub amount: f64,
    /// `0x`-prefixed 64 hex character address
    pub recipient_address: String,
}

/// Response of `POST /api/resolver`, also used for error bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relayer_fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayerResponse {
    pub fn success(transaction_hash: String, user_amount: f64, relayer_fee: f64) -> Self {
        Self {
            success: true,
            transaction_hash: Some(transaction_hash),
            user_amount: Some(user_amount),
            relayer_fee: Some(relayer_fee),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_hash: None,
            user_amount: None,
            relayer_fee: None,
            error: Some(error.into()),
        }
    }
}

/// System health status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub network: String,
    pub relayer_configured: bool,
    /// Unix seconds
    pub timestamp: i64,
}

/// Query of `GET /api/analytics/:address/export`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    #[serde(default)]
    pub include_private: bool,
}
