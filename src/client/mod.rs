//! User-side flows
//!
//! Deposit and withdraw the way the web views do it: validate the input,
//! refuse to start while another action is in flight, sign or relay, and
//! report one [`ClientError`] on failure.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::aptos::AptosError;
use crate::note::NoteError;

pub mod deposit;
pub mod relayer_client;
pub mod withdraw;

pub use deposit::{write_note, DepositAmount, DepositFlow, DepositReceipt};
pub use relayer_client::RelayerClient;
pub use withdraw::{WithdrawFlow, WithdrawMode, WithdrawReceipt};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Please select a pool or enter a valid amount")]
    InvalidAmount,

    #[error("Please enter your secret note")]
    MissingNote,

    #[error("Invalid secret note: {0}")]
    InvalidNote(#[from] NoteError),

    #[error("Please enter a recipient address")]
    MissingRecipient,

    #[error("Address must start with 0x")]
    RecipientPrefix,

    #[error("Invalid recipient address format")]
    InvalidRecipient,

    #[error("Another transaction is already in progress")]
    Busy,

    #[error("Transaction failed: {0}")]
    Chain(#[from] AptosError),

    #[error("No relayer configured")]
    RelayerUnavailable,

    #[error("Relayer request failed: {0}")]
    RelayerTransport(String),

    /// Rejection reported by the relayer itself
    #[error("{0}")]
    Relayer(String),

    #[error("Failed to save note: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// One action at a time per flow
#[derive(Debug, Default)]
pub struct ActionGate {
    busy: AtomicBool,
}

impl ActionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate until the returned guard drops
    pub fn try_begin(&self) -> ClientResult<ActionGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ClientError::Busy)?;
        Ok(ActionGuard { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

pub struct ActionGuard<'a> {
    gate: &'a ActionGate,
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_is_exclusive() {
        let gate = ActionGate::new();
        let guard = gate.try_begin().unwrap();
        assert!(gate.is_busy());
        assert!(matches!(gate.try_begin(), Err(ClientError::Busy)));

        drop(guard);
        assert!(!gate.is_busy());
        assert!(gate.try_begin().is_ok());
    }
}
