//! In-memory chain used by the unit tests.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

use crate::aptos::{
    AptosError, AptosResult, ChainReader, ChainSubmitter, EntryFunctionPayload, LocalAccount,
    Transaction, TransactionPayload,
};

pub const MODULE: &str = "0x2267d403073795ada7cb1da76029e92c2b0b693ecfbdc31e1ea65c57584d33bd";

/// How the mock answers a submission
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Success(String),
    /// Committed with a failing vm status
    Aborted(String),
    /// Never reached the chain
    Unreachable(String),
}

pub struct MockChain {
    pub submitted: Mutex<Vec<(String, EntryFunctionPayload)>>,
    pub outcome: SubmitOutcome,
    pub transactions: Vec<Transaction>,
    pub mixer_exists: bool,
    pub balance: u64,
    pub reader_down: bool,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            submitted: Mutex::new(Vec::new()),
            outcome: SubmitOutcome::Success("0xfeed".into()),
            transactions: Vec::new(),
            mixer_exists: true,
            balance: 0,
            reader_down: false,
        }
    }
}

impl MockChain {
    pub fn with_outcome(outcome: SubmitOutcome) -> Self {
        Self {
            outcome,
            ..Self::default()
        }
    }

    pub fn submissions(&self) -> Vec<(String, EntryFunctionPayload)> {
        self.submitted.lock().unwrap().clone()
    }

    fn check_reader(&self) -> AptosResult<()> {
        if self.reader_down {
            return Err(AptosError::InvalidResponse("node unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainSubmitter for MockChain {
    async fn submit_and_wait(
        &self,
        signer: &LocalAccount,
        payload: &EntryFunctionPayload,
    ) -> AptosResult<Transaction> {
        self.submitted
            .lock()
            .unwrap()
            .push((signer.address().to_string(), payload.clone()));

        match &self.outcome {
            SubmitOutcome::Success(hash) => Ok(Transaction {
                kind: "user_transaction".into(),
                hash: hash.clone(),
                success: Some(true),
                ..Transaction::default()
            }),
            SubmitOutcome::Aborted(vm_status) => Err(AptosError::TransactionFailed {
                hash: "0xbad".into(),
                vm_status: vm_status.clone(),
            }),
            SubmitOutcome::Unreachable(message) => Err(AptosError::Api {
                status: 500,
                message: message.clone(),
                error_code: None,
                vm_error_code: None,
            }),
        }
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn account_transactions(
        &self,
        _address: &str,
        limit: u16,
    ) -> AptosResult<Vec<Transaction>> {
        self.check_reader()?;
        Ok(self.transactions.iter().take(limit as usize).cloned().collect())
    }

    async fn resource_exists(&self, _address: &str, _resource_type: &str) -> AptosResult<bool> {
        self.check_reader()?;
        Ok(self.mixer_exists)
    }

    async fn coin_balance(&self, _address: &str, _coin_type: &str) -> AptosResult<u64> {
        self.check_reader()?;
        Ok(self.balance)
    }
}

/// A committed user transaction calling `function`
pub fn user_tx(
    version: u64,
    sender: &str,
    function: &str,
    arguments: &[&str],
    timestamp_micros: u64,
) -> Transaction {
    Transaction {
        kind: "user_transaction".into(),
        hash: format!("0x{:064x}", version),
        version: Some(version.to_string()),
        sender: Some(sender.to_string()),
        success: Some(true),
        vm_status: Some("Executed successfully".into()),
        timestamp: Some(timestamp_micros.to_string()),
        gas_used: Some("10".into()),
        payload: Some(TransactionPayload {
            kind: "entry_function_payload".into(),
            function: Some(function.to_string()),
            type_arguments: vec!["0x1::aptos_coin::AptosCoin".into()],
            arguments: arguments.iter().map(|a| json!(a)).collect(),
        }),
    }
}

pub fn full_address(fill: char) -> String {
    format!("0x{}", fill.to_string().repeat(64))
}
