//! Local ed25519 signing account
//!
//! Holds a private key and the Aptos account address derived from it
//! (single-signer authentication key: `sha3_256(public_key || 0x00)`).

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use sha3::{Digest, Sha3_256};

use super::types::{TransactionSignature, ED25519_SIGNATURE};
use super::{AptosError, AptosResult};

/// Authentication scheme byte for single ed25519 keys
const ED25519_SCHEME: u8 = 0x00;

/// Prefix used by the Aptos CLI and wallets when exporting keys
const AIP80_PREFIX: &str = "ed25519-priv-";

#[derive(Clone)]
pub struct LocalAccount {
    signing_key: SigningKey,
    address: String,
}

impl LocalAccount {
    pub fn new(signing_key: SigningKey) -> Self {
        let address = derive_address(&signing_key.verifying_key().to_bytes());
        Self { signing_key, address }
    }

    /// Parse a hex private key. Accepts an optional `ed25519-priv-` and/or
    /// `0x` prefix.
    pub fn from_private_key_hex(key: &str) -> AptosResult<Self> {
        let key = key.trim();
        let key = key.strip_prefix(AIP80_PREFIX).unwrap_or(key);
        let key = key.strip_prefix("0x").unwrap_or(key);

        let bytes = hex::decode(key)
            .map_err(|e| AptosError::InvalidKey(format!("private key is not hex: {}", e)))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            AptosError::InvalidKey(format!("private key must be 32 bytes, got {}", b.len()))
        })?;

        Ok(Self::new(SigningKey::from_bytes(&bytes)))
    }

    /// Fresh random account
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::new(SigningKey::from_bytes(&bytes))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.public_key().to_bytes()))
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Sign an encoded submission and wrap it for `/transactions`
    pub fn sign_submission(&self, signing_message: &[u8]) -> TransactionSignature {
        let signature = self.sign(signing_message);
        TransactionSignature {
            kind: ED25519_SIGNATURE.to_string(),
            public_key: self.public_key_hex(),
            signature: format!("0x{}", hex::encode(signature.to_bytes())),
        }
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.public_key().verify(message, signature).is_ok()
    }
}

impl std::fmt::Debug for LocalAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAccount")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Account address for a single ed25519 public key
pub fn derive_address(public_key: &[u8; 32]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key);
    hasher.update([ED25519_SCHEME]);
    format!("0x{}", hex::encode(hasher.finalize()))
}
