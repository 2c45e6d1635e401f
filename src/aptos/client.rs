//! HTTP client for the Aptos fullnode REST API.
//!
//! Endpoints:
//! - GET  /accounts/{address}
//! - GET  /accounts/{address}/transactions?limit=N
//! - GET  /accounts/{address}/resource/{type}
//! - GET  /estimate_gas_price
//! - POST /transactions/encode_submission
//! - POST /transactions
//! - GET  /transactions/by_hash/{hash}
//! - POST /view

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::types::*;
use super::{AptosError, AptosResult, ChainReader, ChainSubmitter, LocalAccount};

/// Client tuning
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Confirmation polls before giving up on a submitted transaction
    pub confirmation_attempts: u32,
    pub poll_interval: Duration,
    pub max_gas_amount: u64,
    /// Seconds from now until a submitted transaction expires
    pub expiration_secs: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            confirmation_attempts: 30,
            poll_interval: Duration::from_secs(1),
            max_gas_amount: 200_000,
            expiration_secs: 60,
        }
    }
}

/// Aptos fullnode client
pub struct AptosClient {
    base_url: String,
    http: reqwest::Client,
    config: ClientConfig,
}

impl AptosClient {
    /// `node_url` is the REST base including the `/v1` segment.
    pub fn new(node_url: &str, config: ClientConfig) -> Self {
        Self {
            base_url: node_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .unwrap_or_default(),
            config,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AptosResult<T> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AptosResult<T> {
        let resp = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Turn non-2xx responses into [`AptosError::Api`]
    async fn check(resp: reqwest::Response) -> AptosResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let err = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) => AptosError::Api {
                status: status.as_u16(),
                message: body.message,
                error_code: body.error_code,
                vm_error_code: body.vm_error_code,
            },
            Err(_) => AptosError::Api {
                status: status.as_u16(),
                message: text,
                error_code: None,
                vm_error_code: None,
            },
        };
        Err(err)
    }

    pub async fn account(&self, address: &str) -> AptosResult<AccountData> {
        self.get_json(&format!("/accounts/{}", address)).await
    }

    pub async fn sequence_number(&self, address: &str) -> AptosResult<u64> {
        let account = self.account(address).await?;
        account.sequence_number.parse().map_err(|_| {
            AptosError::InvalidResponse(format!(
                "sequence number {:?} is not an integer",
                account.sequence_number
            ))
        })
    }

    pub async fn estimate_gas_price(&self) -> AptosResult<u64> {
        let estimation: GasEstimation = self.get_json("/estimate_gas_price").await?;
        Ok(estimation.gas_estimate)
    }

    /// Ask the node for the signing message of an unsigned transaction
    pub async fn encode_submission(&self, request: &UserTransactionRequest) -> AptosResult<Vec<u8>> {
        let encoded: String = self
            .post_json("/transactions/encode_submission", request)
            .await?;
        hex::decode(encoded.trim_start_matches("0x"))
            .map_err(|e| AptosError::InvalidResponse(format!("signing message is not hex: {}", e)))
    }

    /// Build, sign and submit without waiting for execution
    pub async fn submit(
        &self,
        signer: &LocalAccount,
        payload: &EntryFunctionPayload,
    ) -> AptosResult<PendingTransaction> {
        let sequence_number = self.sequence_number(signer.address()).await?;
        let gas_unit_price = self.estimate_gas_price().await?;
        let expiration = chrono::Utc::now().timestamp() + self.config.expiration_secs;

        let request = UserTransactionRequest {
            sender: signer.address().to_string(),
            sequence_number: sequence_number.to_string(),
            max_gas_amount: self.config.max_gas_amount.to_string(),
            gas_unit_price: gas_unit_price.to_string(),
            expiration_timestamp_secs: expiration.to_string(),
            payload: payload.clone(),
        };

        let signing_message = self.encode_submission(&request).await?;
        let signature = signer.sign_submission(&signing_message);

        let pending: PendingTransaction = self
            .post_json("/transactions", &SubmitTransactionRequest { request, signature })
            .await?;

        log::debug!(
            "submitted {} from {} as {}",
            payload.function,
            signer.address(),
            pending.hash
        );
        Ok(pending)
    }

    /// `None` while the node does not know the hash yet
    pub async fn transaction_by_hash(&self, hash: &str) -> AptosResult<Option<Transaction>> {
        match self.get_json(&format!("/transactions/by_hash/{}", hash)).await {
            Ok(tx) => Ok(Some(tx)),
            Err(AptosError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Poll until the transaction is committed, then check it succeeded
    pub async fn wait_for_transaction(&self, hash: &str) -> AptosResult<Transaction> {
        let attempts = self.config.confirmation_attempts.max(1);

        for attempt in 0..attempts {
            if let Some(tx) = self.transaction_by_hash(hash).await? {
                if !tx.is_pending() {
                    if tx.succeeded() {
                        return Ok(tx);
                    }
                    return Err(AptosError::TransactionFailed {
                        hash: hash.to_string(),
                        vm_status: tx.vm_status.unwrap_or_else(|| "unknown".to_string()),
                    });
                }
            }
            if attempt + 1 < attempts {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }

        Err(AptosError::Timeout {
            hash: hash.to_string(),
            attempts,
        })
    }

    pub async fn view(&self, request: &ViewRequest) -> AptosResult<Vec<Value>> {
        self.post_json("/view", request).await
    }
}

#[async_trait]
impl ChainSubmitter for AptosClient {
    async fn submit_and_wait(
        &self,
        signer: &LocalAccount,
        payload: &EntryFunctionPayload,
    ) -> AptosResult<Transaction> {
        let pending = self.submit(signer, payload).await?;
        self.wait_for_transaction(&pending.hash).await
    }
}

#[async_trait]
impl ChainReader for AptosClient {
    async fn account_transactions(
        &self,
        address: &str,
        limit: u16,
    ) -> AptosResult<Vec<Transaction>> {
        self.get_json(&format!("/accounts/{}/transactions?limit={}", address, limit))
            .await
    }

    async fn resource_exists(&self, address: &str, resource_type: &str) -> AptosResult<bool> {
        let path = format!("/accounts/{}/resource/{}", address, resource_type);
        match self.get_json::<Value>(&path).await {
            Ok(_) => Ok(true),
            Err(AptosError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn coin_balance(&self, address: &str, coin_type: &str) -> AptosResult<u64> {
        let request = ViewRequest {
            function: "0x1::coin::balance".to_string(),
            type_arguments: vec![coin_type.to_string()],
            arguments: vec![Value::String(address.to_string())],
        };
        let values = self.view(&request).await?;
        values
            .first()
            .and_then(|v| match v {
                Value::String(s) => s.parse().ok(),
                Value::Number(n) => n.as_u64(),
                _ => None,
            })
            .ok_or_else(|| AptosError::InvalidResponse(format!("unexpected balance {:?}", values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    /// What the fake node records and how it answers lookups
    #[derive(Default)]
    struct FakeNode {
        submitted: Mutex<Vec<Value>>,
        vm_status: Option<String>,
    }

    async fn spawn_node(node: Arc<FakeNode>) -> String {
        let app = Router::new()
            .route(
                "/v1/accounts/:address",
                get(|| async {
                    Json(json!({ "sequence_number": "7", "authentication_key": "0x00" }))
                }),
            )
            .route(
                "/v1/estimate_gas_price",
                get(|| async { Json(json!({ "gas_estimate": 100 })) }),
            )
            .route(
                "/v1/transactions/encode_submission",
                post(|| async { Json(json!("0x0102030405")) }),
            )
            .route(
                "/v1/transactions",
                post(
                    |State(node): State<Arc<FakeNode>>, Json(body): Json<Value>| async move {
                        node.submitted.lock().unwrap().push(body);
                        (AxumStatus::ACCEPTED, Json(json!({ "hash": "0xfeed" })))
                    },
                ),
            )
            .route(
                "/v1/transactions/by_hash/:hash",
                get(
                    |State(node): State<Arc<FakeNode>>, Path(hash): Path<String>| async move {
                        let success = node.vm_status.is_none();
                        Json(json!({
                            "type": "user_transaction",
                            "hash": hash,
                            "version": "99",
                            "success": success,
                            "vm_status": node.vm_status.clone()
                                .unwrap_or_else(|| "Executed successfully".into()),
                        }))
                    },
                ),
            )
            .route(
                "/v1/accounts/:address/resource/:resource",
                get(|| async {
                    (
                        AxumStatus::NOT_FOUND,
                        Json(json!({ "message": "Resource not found", "error_code": "resource_not_found" })),
                    )
                }),
            )
            .route("/v1/view", post(|| async { Json(json!(["250000000"])) }))
            .with_state(node);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn fast_config() -> ClientConfig {
        ClientConfig {
            confirmation_attempts: 2,
            poll_interval: Duration::from_millis(10),
            ..ClientConfig::default()
        }
    }

    fn payload() -> EntryFunctionPayload {
        EntryFunctionPayload::new(
            "0x2::privacy_pool::deposit".into(),
            vec!["0x1::aptos_coin::AptosCoin".into()],
            vec![json!("0xab12"), json!("100000000")],
        )
    }

    #[tokio::test]
    async fn test_submit_and_wait_signs_encoded_message() {
        let node = Arc::new(FakeNode::default());
        let url = spawn_node(node.clone()).await;
        let client = AptosClient::new(&url, fast_config());
        let signer = LocalAccount::generate();

        let tx = client.submit_and_wait(&signer, &payload()).await.unwrap();
        assert_eq!(tx.hash, "0xfeed");
        assert_eq!(tx.version_number(), Some(99));

        let submitted = node.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        let body = &submitted[0];
        assert_eq!(body["sender"], signer.address());
        assert_eq!(body["sequence_number"], "7");
        assert_eq!(body["gas_unit_price"], "100");
        assert_eq!(body["payload"]["function"], "0x2::privacy_pool::deposit");
        assert_eq!(body["signature"]["public_key"], signer.public_key_hex());

        let raw = hex::decode(body["signature"]["signature"].as_str().unwrap().trim_start_matches("0x"))
            .unwrap();
        let signature = ed25519_dalek::Signature::from_slice(&raw).unwrap();
        assert!(signer.verify(&[1, 2, 3, 4, 5], &signature));
    }

    #[tokio::test]
    async fn test_aborted_transaction_reports_vm_status() {
        let node = Arc::new(FakeNode {
            vm_status: Some("Move abort in 0x2::privacy_pool: E_SECRET_ALREADY_USED(0x1)".into()),
            ..FakeNode::default()
        });
        let url = spawn_node(node).await;
        let client = AptosClient::new(&url, fast_config());

        let err = client
            .submit_and_wait(&LocalAccount::generate(), &payload())
            .await
            .unwrap_err();
        assert_eq!(err.committed_hash(), Some("0xfeed"));
        assert!(err.to_string().contains("E_SECRET_ALREADY_USED"));
    }

    #[tokio::test]
    async fn test_reader_queries() {
        let url = spawn_node(Arc::new(FakeNode::default())).await;
        let client = AptosClient::new(&url, fast_config());

        let exists = client
            .resource_exists("0x2", "0x2::privacy_pool::Mixer<0x1::aptos_coin::AptosCoin>")
            .await
            .unwrap();
        assert!(!exists);

        let balance = client
            .coin_balance("0x2", "0x1::aptos_coin::AptosCoin")
            .await
            .unwrap();
        assert_eq!(balance, 250_000_000);
    }

    #[tokio::test]
    async fn test_unreachable_node_is_http_error() {
        let client = AptosClient::new("http://127.0.0.1:9/v1", fast_config());
        let err = client.estimate_gas_price().await.unwrap_err();
        assert!(matches!(err, AptosError::Http(_)));
    }
}
