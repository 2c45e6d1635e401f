//! HTTP server
//!
//! Router construction and the builder used by the `relayer_server` binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use super::handlers::{export_analytics, health_check, method_not_allowed, pool_stats, user_analytics};
use super::middleware::{create_cors_layer, log_requests};
use super::resolver::resolve_withdrawal;
use super::state::AppState;

/// Request bodies above this are rejected with 413
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 64 * 1024;

/// Create API router with all endpoints
pub fn create_router(state: Arc<AppState>, max_request_size: usize) -> Router {
    Router::new()
        .route(
            "/api/resolver",
            post(resolve_withdrawal).fallback(method_not_allowed),
        )
        .route("/api/health", get(health_check))
        .route("/api/stats", get(pool_stats))
        .route("/api/analytics/:address", get(user_analytics))
        .route("/api/analytics/:address/export", get(export_analytics))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(create_cors_layer())
        .layer(middleware::from_fn(log_requests))
}

pub struct ApiServer {
    bind_addr: SocketAddr,
    router: Router,
}

impl ApiServer {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        log::info!("FlowShield relayer listening on http://{}", listener.local_addr()?);
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

pub struct ApiServerBuilder {
    bind_addr: SocketAddr,
    max_request_size: usize,
    state: Option<Arc<AppState>>,
}

impl Default for ApiServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_request_size: DEFAULT_MAX_REQUEST_SIZE,
            state: None,
        }
    }

    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn max_request_size(mut self, size: usize) -> Self {
        self.max_request_size = size;
        self
    }

    pub fn state(mut self, state: Arc<AppState>) -> Self {
        self.state = Some(state);
        self
    }

    pub fn build(self) -> Result<ApiServer> {
        let state = self
            .state
            .ok_or_else(|| anyhow!("ApiServerBuilder requires application state"))?;
        Ok(ApiServer {
            bind_addr: self.bind_addr,
            router: create_router(state, self.max_request_size),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aptos::LocalAccount;
    use crate::config::Network;
    use crate::pool::PrivacyPool;
    use crate::test_utils::{full_address, user_tx, MockChain, SubmitOutcome, MODULE};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(chain: Arc<MockChain>, with_relayer: bool) -> Router {
        let state = AppState {
            pool: PrivacyPool::new(MODULE),
            network: Network::Devnet,
            relayer: with_relayer.then(LocalAccount::generate),
            submitter: chain.clone(),
            reader: chain,
        };
        create_router(Arc::new(state), DEFAULT_MAX_REQUEST_SIZE)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_resolver(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/resolver")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn valid_body() -> Value {
        json!({
            "secretHash": "ab12",
            "amount": 10,
            "recipientAddress": full_address('0'),
        })
    }

    #[tokio::test]
    async fn test_relayed_withdrawal() {
        let chain = Arc::new(MockChain::default());
        let (status, body) = send(app(chain.clone(), true), post_resolver(valid_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["transactionHash"], "0xfeed");
        assert_eq!(body["relayerFee"], 0.5);
        assert_eq!(body["userAmount"], 9.5);
        assert!(body.get("error").is_none());

        let submissions = chain.submissions();
        assert_eq!(submissions.len(), 1);
        let payload = &submissions[0].1;
        assert_eq!(
            payload.function,
            format!("{}::privacy_pool::withdraw_via_relayer", MODULE)
        );
        assert_eq!(payload.type_arguments, vec!["0x1::aptos_coin::AptosCoin"]);
        assert_eq!(
            payload.arguments,
            vec![json!("0xab12"), json!("1000000000"), json!(full_address('0'))]
        );
    }

    #[tokio::test]
    async fn test_unconfigured_relayer() {
        let chain = Arc::new(MockChain::default());
        let (status, body) = send(app(chain.clone(), false), post_resolver(valid_body())).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({ "success": false, "error": "Relayer service is not configured" }));
        assert!(chain.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_requests_never_reach_chain() {
        let chain = Arc::new(MockChain::default());
        let cases = [
            (json!({ "amount": 10, "recipientAddress": full_address('0') }), "Invalid secret hash"),
            (json!({ "secretHash": "ab12", "recipientAddress": full_address('0') }), "Invalid amount"),
            (
                json!({ "secretHash": "ab12", "amount": -3, "recipientAddress": full_address('0') }),
                "Invalid amount",
            ),
            (json!({ "secretHash": "ab12", "amount": 1 }), "Invalid recipient address"),
            (
                json!({ "secretHash": "ab12", "amount": 1, "recipientAddress": "0x1234" }),
                "Invalid recipient address format",
            ),
            (
                json!({ "secretHash": "ab12", "amount": 1, "recipientAddress": format!("1x{}", "0".repeat(64)) }),
                "Invalid recipient address format",
            ),
            (
                json!({ "secretHash": "0xab12", "amount": 1, "recipientAddress": full_address('0') }),
                "Invalid secret hash format",
            ),
        ];

        for (body, message) in cases {
            let (status, response) = send(app(chain.clone(), true), post_resolver(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response["error"], message);
        }

        let request = Request::builder()
            .method("POST")
            .uri("/api/resolver")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, response) = send(app(chain.clone(), true), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "Withdrawal failed");

        assert!(chain.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_get_resolver_not_allowed() {
        let chain = Arc::new(MockChain::default());
        for with_relayer in [true, false] {
            let (status, body) = send(app(chain.clone(), with_relayer), get("/api/resolver")).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body, json!({ "success": false, "error": "Method not allowed" }));
        }
    }

    #[tokio::test]
    async fn test_chain_failures_are_mapped() {
        let chain = Arc::new(MockChain::with_outcome(SubmitOutcome::Aborted(
            "Move abort: E_SECRET_ALREADY_USED".into(),
        )));
        let (status, body) = send(app(chain.clone(), true), post_resolver(valid_body())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "This secret note has already been used");
        assert_eq!(chain.submissions().len(), 1);

        let chain = Arc::new(MockChain::with_outcome(SubmitOutcome::Aborted("OUT_OF_GAS".into())));
        let (_, body) = send(app(chain, true), post_resolver(valid_body())).await;
        assert_eq!(body["error"], "Transaction failed on-chain");

        let chain = Arc::new(MockChain::with_outcome(SubmitOutcome::Unreachable(
            "connection reset".into(),
        )));
        let (_, body) = send(app(chain, true), post_resolver(valid_body())).await;
        assert_eq!(body["error"], "Withdrawal failed");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let chain = Arc::new(MockChain::default());
        let padding = "a".repeat(DEFAULT_MAX_REQUEST_SIZE + 1);
        let body = json!({ "secretHash": padding, "amount": 1, "recipientAddress": full_address('0') });
        let response = app(chain.clone(), true)
            .oneshot(post_resolver(body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(chain.submissions().is_empty());

        let (status, body) = send(app(chain.clone(), true), post_resolver(oversized())).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, json!({ "success": false, "error": "Request body too large" }));
    }

    fn oversized() -> Value {
        json!({
            "secretHash": "a".repeat(DEFAULT_MAX_REQUEST_SIZE + 1),
            "amount": 1,
            "recipientAddress": full_address('0'),
        })
    }

    #[tokio::test]
    async fn test_unconfigured_relayer_ignores_body_size() {
        let chain = Arc::new(MockChain::default());
        let (status, body) = send(app(chain.clone(), false), post_resolver(oversized())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Relayer service is not configured");
        assert!(chain.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_health() {
        let chain = Arc::new(MockChain::default());
        let (status, body) = send(app(chain, false), get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "flowshield-relayer");
        assert_eq!(body["network"], "devnet");
        assert_eq!(body["relayerConfigured"], false);
    }

    #[tokio::test]
    async fn test_stats_and_analytics_routes() {
        let user = full_address('a');
        let deposit = format!("{}::privacy_pool::deposit", MODULE);
        let mut chain = MockChain::default();
        chain.balance = 100_000_000;
        chain.transactions = vec![user_tx(7, &user, &deposit, &["0xab", "100000000"], 1_700_000_000_000_000)];
        let chain = Arc::new(chain);

        let (status, body) = send(app(chain.clone(), false), get("/api/stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalDeposits"], 1);
        assert_eq!(body["poolStats"].as_array().unwrap().len(), 4);

        let (status, body) =
            send(app(chain.clone(), false), get(&format!("/api/analytics/{}", user))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["privacyStats"]["totalDeposits"], 1);

        let (status, body) = send(app(chain.clone(), false), get("/api/analytics/alice")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid address");

        let (status, body) = send(
            app(chain, false),
            get(&format!("/api/analytics/{}/export", user)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["walletStats"]["recentTransactions"], "Hidden for privacy");
    }
}
