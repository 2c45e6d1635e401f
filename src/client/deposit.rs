//! Deposit flow
//!
//! Picks the amount, generates a fresh secret note and submits
//! `deposit<AptosCoin>(secret_hash, amount)` signed by the user. The note is
//! the only way to withdraw later; it is returned to the caller and never
//! stored here.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use super::{ActionGate, ClientError, ClientResult};
use crate::aptos::{ChainSubmitter, LocalAccount};
use crate::note::SecretNote;
use crate::pool::{apt_to_octas, parse_apt, PrivacyPool, DENOMINATIONS};

/// Amount chosen in the deposit form. A selected pool takes precedence over
/// anything typed in the custom field.
#[derive(Debug, Clone, PartialEq)]
pub enum DepositAmount {
    Pool(f64),
    Custom(String),
}

impl DepositAmount {
    /// Amount in octas
    pub fn resolve(&self) -> ClientResult<u64> {
        let octas = match self {
            DepositAmount::Pool(denomination) if DENOMINATIONS.contains(denomination) => {
                apt_to_octas(*denomination)
            }
            DepositAmount::Pool(_) => None,
            DepositAmount::Custom(text) => parse_apt(text),
        };
        match octas {
            Some(octas) if octas > 0 => Ok(octas),
            _ => Err(ClientError::InvalidAmount),
        }
    }
}

/// Write an encoded note to a new file. An existing file is never
/// overwritten: it may hold the only copy of another note.
pub fn write_note(note: &SecretNote, path: &Path) -> ClientResult<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    writeln!(file, "{}", note.encode())?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DepositReceipt {
    pub note: SecretNote,
    pub transaction_hash: String,
}

impl DepositReceipt {
    pub fn save_note(&self, path: &Path) -> ClientResult<()> {
        write_note(&self.note, path)
    }
}

pub struct DepositFlow {
    pool: PrivacyPool,
    submitter: Arc<dyn ChainSubmitter>,
    gate: ActionGate,
}

impl DepositFlow {
    pub fn new(pool: PrivacyPool, submitter: Arc<dyn ChainSubmitter>) -> Self {
        Self {
            pool,
            submitter,
            gate: ActionGate::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    pub async fn deposit(
        &self,
        signer: &LocalAccount,
        amount: &DepositAmount,
    ) -> ClientResult<DepositReceipt> {
        let _guard = self.gate.try_begin()?;
        let octas = amount.resolve()?;

        let note = SecretNote::generate(octas);
        let payload = self
            .pool
            .deposit_payload(&note.secret_hash().to_hex(), octas);

        log::info!("Depositing {} octas from {}", octas, signer.address());
        let tx = self.submitter.submit_and_wait(signer, &payload).await?;
        log::info!("Deposit committed: {}", tx.hash);

        Ok(DepositReceipt {
            note,
            transaction_hash: tx.hash,
        })
    }
}
