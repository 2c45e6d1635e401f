//! Fullnode REST Types
//!
//! JSON shapes exchanged with the Aptos fullnode API (`/v1`). Numeric
//! 64-bit fields travel as decimal strings on the wire.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload kind tag for entry function calls
pub const ENTRY_FUNCTION_PAYLOAD: &str = "entry_function_payload";

/// Signature kind tag for single ed25519 signers
pub const ED25519_SIGNATURE: &str = "ed25519_signature";

/// Entry function call, as submitted inside a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    /// Fully qualified function id (`<address>::<module>::<function>`)
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}

impl EntryFunctionPayload {
    pub fn new(function: String, type_arguments: Vec<String>, arguments: Vec<Value>) -> Self {
        Self {
            kind: ENTRY_FUNCTION_PAYLOAD.to_string(),
            function,
            type_arguments,
            arguments,
        }
    }
}

/// Unsigned transaction body sent to `/transactions/encode_submission`
#[derive(Debug, Clone, Serialize)]
pub struct UserTransactionRequest {
    pub sender: String,
    pub sequence_number: String,
    pub max_gas_amount: String,
    pub gas_unit_price: String,
    pub expiration_timestamp_secs: String,
    pub payload: EntryFunctionPayload,
}

/// Signed transaction body sent to `/transactions`
#[derive(Debug, Clone, Serialize)]
pub struct SubmitTransactionRequest {
    #[serde(flatten)]
    pub request: UserTransactionRequest,
    pub signature: TransactionSignature,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionSignature {
    #[serde(rename = "type")]
    pub kind: String,
    pub public_key: String,
    pub signature: String,
}

/// Response of a successful submission
#[derive(Debug, Clone, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
}

/// `/accounts/{address}`
#[derive(Debug, Clone, Deserialize)]
pub struct AccountData {
    pub sequence_number: String,
    pub authentication_key: String,
}

/// `/estimate_gas_price`
#[derive(Debug, Clone, Deserialize)]
pub struct GasEstimation {
    pub gas_estimate: u64,
}

/// Body of `/view`
#[derive(Debug, Clone, Serialize)]
pub struct ViewRequest {
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}

/// Error body returned by the fullnode on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub vm_error_code: Option<u64>,
}

/// A transaction as returned by the history and lookup endpoints.
///
/// Only the fields the relayer and the analytics read are modelled; every
/// field is optional because pending, genesis and block-metadata
/// transactions carry different subsets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub vm_status: Option<String>,
    /// Microseconds since the unix epoch
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
    #[serde(default)]
    pub payload: Option<TransactionPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub type_arguments: Vec<String>,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

impl Transaction {
    pub fn is_pending(&self) -> bool {
        self.kind == "pending_transaction"
    }

    pub fn is_user_transaction(&self) -> bool {
        self.kind == "user_transaction"
    }

    pub fn succeeded(&self) -> bool {
        self.success.unwrap_or(false)
    }

    pub fn function(&self) -> Option<&str> {
        self.payload.as_ref()?.function.as_deref()
    }

    /// Argument at `index` rendered as a string. Numbers and strings are
    /// accepted; anything else is treated as absent.
    pub fn argument(&self, index: usize) -> Option<String> {
        match self.payload.as_ref()?.arguments.get(index)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Argument at `index` parsed as an unsigned integer (octas)
    pub fn argument_u64(&self, index: usize) -> Option<u64> {
        self.argument(index)?.parse().ok()
    }

    pub fn version_number(&self) -> Option<u64> {
        self.version.as_deref()?.parse().ok()
    }

    pub fn timestamp_micros(&self) -> Option<u64> {
        self.timestamp.as_deref()?.parse().ok()
    }
}
