//! Aptos Fullnode Access
//!
//! Thin REST client for the node endpoints the relayer and the analytics
//! need. Transactions are encoded by the node
//! (`/transactions/encode_submission`), signed locally with ed25519 and
//! submitted as JSON, so no BCS encoding lives in this crate.
//!
//! The rest of the crate depends on the [`ChainSubmitter`] and
//! [`ChainReader`] traits rather than on [`AptosClient`] directly.

use async_trait::async_trait;

pub mod account;
pub mod client;
pub mod types;

pub use account::{derive_address, LocalAccount};
pub use client::{AptosClient, ClientConfig};
pub use types::*;

/// Fullnode and transaction errors
#[derive(Debug, thiserror::Error)]
pub enum AptosError {
    #[error("request to fullnode failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fullnode returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        error_code: Option<String>,
        vm_error_code: Option<u64>,
    },

    #[error("transaction {hash} failed: {vm_status}")]
    TransactionFailed { hash: String, vm_status: String },

    #[error("transaction {hash} not confirmed after {attempts} attempts")]
    Timeout { hash: String, attempts: u32 },

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("unexpected fullnode response: {0}")]
    InvalidResponse(String),
}

impl AptosError {
    /// Hash of a transaction that was committed but did not succeed
    pub fn committed_hash(&self) -> Option<&str> {
        match self {
            AptosError::TransactionFailed { hash, .. } => Some(hash),
            _ => None,
        }
    }
}

/// Result type for fullnode operations
pub type AptosResult<T> = Result<T, AptosError>;

/// Signs, submits and confirms a single entry function call
#[async_trait]
pub trait ChainSubmitter: Send + Sync {
    /// Returns the committed transaction once it executed successfully.
    /// A committed-but-aborted transaction is an
    /// [`AptosError::TransactionFailed`].
    async fn submit_and_wait(
        &self,
        signer: &LocalAccount,
        payload: &EntryFunctionPayload,
    ) -> AptosResult<Transaction>;
}

/// Read-only chain queries used by the analytics
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Transactions sent by `address`, at most `limit`, in node order
    async fn account_transactions(&self, address: &str, limit: u16)
        -> AptosResult<Vec<Transaction>>;

    async fn resource_exists(&self, address: &str, resource_type: &str) -> AptosResult<bool>;

    /// Balance in the coin's smallest unit
    async fn coin_balance(&self, address: &str, coin_type: &str) -> AptosResult<u64>;
}
