//! Relayed withdrawals
//!
//! `POST /api/resolver` takes a secret hash, an amount and a recipient, and
//! submits `withdraw_via_relayer` signed by the relayer account, so the
//! recipient never appears as the sender of the withdrawal.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use super::error::{RelayerError, RelayerResult};
use super::state::AppState;
use super::types::RelayerResponse;
use crate::aptos::AptosError;
use crate::pool::{apt_to_octas, FeeSplit};
use crate::validation::{is_full_address, is_hex, truncate};

pub const GENERIC_FAILURE: &str = "Withdrawal failed";
pub const ONCHAIN_FAILURE: &str = "Transaction failed on-chain";

/// Abort codes and their client messages, checked in order
const FAILURE_MESSAGES: [(&str, &str); 4] = [
    ("E_SECRET_ALREADY_USED", "This secret note has already been used"),
    ("E_DEPOSIT_NOT_FOUND", "Invalid secret note or deposit not found"),
    ("E_POOL_NOT_FOUND", "Pool not found for this amount"),
    ("INSUFFICIENT_BALANCE", "Insufficient balance in the pool"),
];

/// A validated withdrawal
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalRequest {
    pub secret_hash: String,
    pub amount: f64,
    pub amount_octas: u64,
    pub recipient: String,
}

/// Decode and validate a raw request body
pub fn parse_request(body: &[u8]) -> RelayerResult<WithdrawalRequest> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| RelayerError::Withdrawal(GENERIC_FAILURE.to_string()))?;
    validate_request(&value)
}

/// Field checks, first failure wins
pub fn validate_request(body: &Value) -> RelayerResult<WithdrawalRequest> {
    let body = body
        .as_object()
        .ok_or_else(|| RelayerError::Withdrawal(GENERIC_FAILURE.to_string()))?;

    let secret_hash = match body.get("secretHash") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => return Err(RelayerError::InvalidSecretHash),
    };

    let amount = match body.get("amount").and_then(Value::as_f64) {
        Some(a) if a.is_finite() && a > 0.0 => a,
        _ => return Err(RelayerError::InvalidAmount),
    };
    let amount_octas = match apt_to_octas(amount) {
        Some(octas) if octas > 0 => octas,
        _ => return Err(RelayerError::InvalidAmount),
    };

    let recipient = match body.get("recipientAddress") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => return Err(RelayerError::InvalidRecipient),
    };
    if !is_full_address(&recipient) {
        return Err(RelayerError::InvalidRecipientFormat);
    }

    if !is_hex(&secret_hash) {
        return Err(RelayerError::InvalidSecretHashFormat);
    }

    Ok(WithdrawalRequest {
        secret_hash,
        amount,
        amount_octas,
        recipient,
    })
}

/// Client-facing message for a failed submission
pub fn failure_message(err: &AptosError) -> &'static str {
    let text = err.to_string();
    if let Some((_, message)) = FAILURE_MESSAGES
        .iter()
        .find(|(code, _)| text.contains(code))
    {
        return message;
    }
    if err.committed_hash().is_some() {
        ONCHAIN_FAILURE
    } else {
        GENERIC_FAILURE
    }
}

/// The body is read only after the relayer key check, so an unconfigured
/// relayer answers 503 whatever the request size.
pub async fn resolve_withdrawal(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> RelayerResult<Json<RelayerResponse>> {
    let relayer = match &state.relayer {
        Some(account) => account,
        None => {
            log::error!("Relayer request rejected: RELAYER_PRIVATE_KEY not configured");
            return Err(RelayerError::NotConfigured);
        }
    };

    // Honours the router's DefaultBodyLimit
    let body = Bytes::from_request(request, &state)
        .await
        .map_err(|rejection| match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => RelayerError::PayloadTooLarge,
            _ => RelayerError::Withdrawal(GENERIC_FAILURE.to_string()),
        })?;

    let request = parse_request(&body)?;
    let fee = FeeSplit::for_amount(request.amount);

    log::info!(
        "Relayer withdrawal: hash={} amount={} recipient={} relayer={}",
        truncate(&request.secret_hash, 10),
        request.amount,
        truncate(&request.recipient, 10),
        relayer.address()
    );

    let payload = state.pool.withdraw_via_relayer_payload(
        &request.secret_hash,
        request.amount_octas,
        &request.recipient,
    );

    match state.submitter.submit_and_wait(relayer, &payload).await {
        Ok(tx) => {
            log::info!(
                "Relayer withdrawal committed: {} (user {} APT, fee {} APT)",
                tx.hash,
                fee.user_amount,
                fee.relayer_fee
            );
            Ok(Json(RelayerResponse::success(
                tx.hash,
                fee.user_amount,
                fee.relayer_fee,
            )))
        }
        Err(e) => {
            log::error!("Relayer withdrawal failed: {}", e);
            Err(RelayerError::Withdrawal(failure_message(&e).to_string()))
        }
    }
}
