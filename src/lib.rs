//! FlowShield
//!
//! Privacy mixer client and relayer for the `privacy_pool` Move module on
//! Aptos. Users deposit a fixed amount against `sha3_256(secret)` and later
//! withdraw with the secret, either signing themselves or through the relayer
//! service, which signs on their behalf for a fee.

pub mod analytics;
pub mod api;
pub mod aptos;
pub mod client;
pub mod config;
pub mod note;
pub mod pool;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export main types for easy access
pub use aptos::{AptosClient, AptosError, ChainReader, ChainSubmitter, LocalAccount};
pub use config::{Config, ConfigError, Network};
pub use note::{NoteError, SecretHash, SecretNote};
pub use pool::{FeeSplit, PrivacyPool};
