//! Secret Note
//!
//! A note is the user's only proof of a deposit:
//!
//! ```text
//! flowshield-<amount_octas>-<secret_hex>
//! ```
//!
//! `secret_hex` is 32 random bytes in lowercase hex. The on-chain commitment
//! is `sha3_256(secret)`; the embedded amount only tells the holder which
//! pool to withdraw from.

use rand::RngCore;
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;

use crate::pool::octas_to_apt;

pub const NOTE_PREFIX: &str = "flowshield";

const SECRET_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteError {
    #[error("secret note is empty")]
    Empty,

    #[error("malformed secret note: {0}")]
    Malformed(String),

    #[error("invalid note amount: {0}")]
    InvalidAmount(String),

    #[error("invalid note secret: {0}")]
    InvalidSecret(String),
}

/// Commitment posted on-chain for a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SecretHash([u8; 32]);

impl SecretHash {
    pub fn of_secret(secret: &[u8; SECRET_LEN]) -> Self {
        Self(Sha3_256::digest(secret).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex without `0x`, the form the relayer endpoint accepts
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SecretNote {
    secret: [u8; SECRET_LEN],
    amount_octas: u64,
}

impl SecretNote {
    /// New note with a fresh OS-random secret
    pub fn generate(amount_octas: u64) -> Self {
        let mut secret = [0u8; SECRET_LEN];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        Self::from_parts(secret, amount_octas)
    }

    pub fn from_parts(secret: [u8; SECRET_LEN], amount_octas: u64) -> Self {
        Self {
            secret,
            amount_octas,
        }
    }

    pub fn parse(text: &str) -> Result<Self, NoteError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NoteError::Empty);
        }

        let mut parts = text.splitn(3, '-');
        let (prefix, amount, secret) = match (parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(a), Some(s)) => (p, a, s),
            _ => {
                return Err(NoteError::Malformed(format!(
                    "expected {}-<amount>-<secret>",
                    NOTE_PREFIX
                )))
            }
        };

        if prefix != NOTE_PREFIX {
            return Err(NoteError::Malformed(format!("unknown prefix {:?}", prefix)));
        }

        if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NoteError::InvalidAmount(amount.to_string()));
        }
        let amount_octas: u64 = amount
            .parse()
            .map_err(|_| NoteError::InvalidAmount(amount.to_string()))?;
        if amount_octas == 0 {
            return Err(NoteError::InvalidAmount("amount must be positive".into()));
        }

        let bytes = hex::decode(secret).map_err(|e| NoteError::InvalidSecret(e.to_string()))?;
        let secret: [u8; SECRET_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            NoteError::InvalidSecret(format!("expected {} bytes, got {}", SECRET_LEN, b.len()))
        })?;

        Ok(Self::from_parts(secret, amount_octas))
    }

    pub fn encode(&self) -> String {
        format!("{}-{}-{}", NOTE_PREFIX, self.amount_octas, hex::encode(self.secret))
    }

    pub fn secret_hash(&self) -> SecretHash {
        SecretHash::of_secret(&self.secret)
    }

    pub fn amount_octas(&self) -> u64 {
        self.amount_octas
    }

    pub fn amount_apt(&self) -> f64 {
        octas_to_apt(self.amount_octas)
    }
}

impl FromStr for SecretNote {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SecretNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

// Never print the secret through Debug (logs, panics).
impl fmt::Debug for SecretNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretNote")
            .field("amount_octas", &self.amount_octas)
            .field("secret_hash", &self.secret_hash().to_hex())
            .finish()
    }
}
