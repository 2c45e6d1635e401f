//! Withdraw flow
//!
//! Direct withdrawals are signed by the user and pay `withdraw_direct`
//! straight to the recipient. Relayed withdrawals hand the secret hash to a
//! relayer service, which signs instead and keeps a fee.

use std::sync::Arc;

use super::relayer_client::RelayerClient;
use super::{ActionGate, ClientError, ClientResult};
use crate::api::RelayerRequest;
use crate::aptos::{ChainSubmitter, LocalAccount};
use crate::note::SecretNote;
use crate::pool::PrivacyPool;
use crate::validation::{is_full_address, truncate};

#[derive(Debug, Clone, Copy)]
pub enum WithdrawMode<'a> {
    /// Signed and paid for by this account
    Direct(&'a LocalAccount),
    Relayer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawReceipt {
    pub transaction_hash: String,
    pub recipient: String,
    /// APT the recipient receives
    pub amount: f64,
    /// Present for relayed withdrawals
    pub relayer_fee: Option<f64>,
}

pub struct WithdrawFlow {
    pool: PrivacyPool,
    submitter: Arc<dyn ChainSubmitter>,
    relayer: Option<RelayerClient>,
    gate: ActionGate,
}

/// Form checks, in the order the form reports them
fn validate(note: &str, recipient: &str) -> ClientResult<(SecretNote, String)> {
    if note.trim().is_empty() {
        return Err(ClientError::MissingNote);
    }
    let recipient = recipient.trim();
    if recipient.is_empty() {
        return Err(ClientError::MissingRecipient);
    }
    if !recipient.starts_with("0x") {
        return Err(ClientError::RecipientPrefix);
    }
    if !is_full_address(recipient) {
        return Err(ClientError::InvalidRecipient);
    }
    let note = SecretNote::parse(note)?;
    Ok((note, recipient.to_string()))
}

impl WithdrawFlow {
    pub fn new(pool: PrivacyPool, submitter: Arc<dyn ChainSubmitter>) -> Self {
        Self {
            pool,
            submitter,
            relayer: None,
            gate: ActionGate::new(),
        }
    }

    pub fn with_relayer(mut self, relayer: RelayerClient) -> Self {
        self.relayer = Some(relayer);
        self
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    pub async fn withdraw(
        &self,
        note: &str,
        recipient: &str,
        mode: WithdrawMode<'_>,
    ) -> ClientResult<WithdrawReceipt> {
        let _guard = self.gate.try_begin()?;
        let (note, recipient) = validate(note, recipient)?;
        let secret_hash = note.secret_hash().to_hex();

        match mode {
            WithdrawMode::Direct(signer) => {
                let payload = self.pool.withdraw_direct_payload(
                    &secret_hash,
                    note.amount_octas(),
                    &recipient,
                );
                log::info!(
                    "Direct withdrawal of {} octas to {}",
                    note.amount_octas(),
                    truncate(&recipient, 10)
                );
                let tx = self.submitter.submit_and_wait(signer, &payload).await?;

                Ok(WithdrawReceipt {
                    transaction_hash: tx.hash,
                    recipient,
                    amount: note.amount_apt(),
                    relayer_fee: None,
                })
            }
            WithdrawMode::Relayer => {
                let relayer = self.relayer.as_ref().ok_or(ClientError::RelayerUnavailable)?;
                let request = RelayerRequest {
                    secret_hash,
                    amount: note.amount_apt(),
                    recipient_address: recipient.clone(),
                };
                log::info!(
                    "Relayed withdrawal of {} APT to {} via {}",
                    request.amount,
                    truncate(&recipient, 10),
                    relayer.base_url()
                );
                let response = relayer.withdraw(&request).await?;

                Ok(WithdrawReceipt {
                    transaction_hash: response.transaction_hash.unwrap_or_default(),
                    recipient,
                    amount: response.user_amount.unwrap_or(request.amount),
                    relayer_fee: response.relayer_fee,
                })
            }
        }
    }
}
