//! Privacy pool contract surface
//!
//! Denominations, unit conversion, the relayer fee split and payload
//! builders for the `privacy_pool` Move module's entry functions.

use serde::Serialize;
use serde_json::Value;

use crate::aptos::EntryFunctionPayload;

/// Octas per APT (10^8)
pub const OCTAS_PER_APT: u64 = 100_000_000;

/// Native coin type every pool is instantiated with
pub const APTOS_COIN: &str = "0x1::aptos_coin::AptosCoin";

pub const POOL_MODULE: &str = "privacy_pool";

/// Share of a relayed withdrawal kept by the relayer
pub const RELAYER_FEE_RATE: f64 = 0.05;

/// Fixed pool denominations in APT
pub const DENOMINATIONS: [f64; 4] = [0.1, 1.0, 10.0, 100.0];

/// Decimal places of one octa
pub const OCTA_DECIMALS: usize = 8;

/// Convert APT to octas, flooring sub-octa fractions. A product within float
/// noise of a whole octa snaps to it, so `octas_to_apt` round-trips exactly.
/// `None` for negative, non-finite or out-of-range amounts.
pub fn apt_to_octas(amount: f64) -> Option<u64> {
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    let scaled = amount * OCTAS_PER_APT as f64;
    let nearest = scaled.round();
    let tolerance = (scaled * f64::EPSILON * 4.0).max(1e-6);
    let octas = if (scaled - nearest).abs() <= tolerance {
        nearest
    } else {
        scaled.floor()
    };
    if octas >= u64::MAX as f64 {
        return None;
    }
    Some(octas as u64)
}

/// Parse a decimal APT string such as `"2.01"` into octas without going
/// through a float. Digits past the eighth decimal place are dropped.
pub fn parse_apt(text: &str) -> Option<u64> {
    let text = text.trim();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let kept = &fraction[..fraction.len().min(OCTA_DECIMALS)];
    let fraction: u64 = format!("{:0<width$}", kept, width = OCTA_DECIMALS).parse().ok()?;

    whole.checked_mul(OCTAS_PER_APT)?.checked_add(fraction)
}

pub fn octas_to_apt(octas: u64) -> f64 {
    octas as f64 / OCTAS_PER_APT as f64
}

/// Denomination in APT matching an octa amount exactly
pub fn denomination_for(octas: u64) -> Option<f64> {
    DENOMINATIONS
        .iter()
        .copied()
        .find(|d| apt_to_octas(*d) == Some(octas))
}

/// Relayer fee breakdown, in APT
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSplit {
    pub relayer_fee: f64,
    pub user_amount: f64,
}

impl FeeSplit {
    pub fn for_amount(amount: f64) -> Self {
        let relayer_fee = amount * RELAYER_FEE_RATE;
        Self {
            relayer_fee,
            user_amount: amount - relayer_fee,
        }
    }
}

/// Handle on a deployed `privacy_pool` module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivacyPool {
    module_address: String,
}

impl PrivacyPool {
    pub fn new(module_address: impl Into<String>) -> Self {
        Self {
            module_address: module_address.into(),
        }
    }

    pub fn module_address(&self) -> &str {
        &self.module_address
    }

    pub fn function_id(&self, name: &str) -> String {
        format!("{}::{}::{}", self.module_address, POOL_MODULE, name)
    }

    /// Resource present once the AptosCoin pool is initialised
    pub fn mixer_resource_type(&self) -> String {
        format!("{}::{}::Mixer<{}>", self.module_address, POOL_MODULE, APTOS_COIN)
    }

    /// Whether an on-chain function id belongs to this pool
    pub fn is_pool_function(&self, function: &str) -> bool {
        function.contains(&self.module_address) && function.contains(POOL_MODULE)
    }

    /// `deposit<AptosCoin>(secret_hash, amount)`
    pub fn deposit_payload(&self, secret_hash: &str, amount_octas: u64) -> EntryFunctionPayload {
        self.payload("deposit", vec![hash_argument(secret_hash), amount_argument(amount_octas)])
    }

    /// `withdraw<AptosCoin>(secret_hash, amount)`, paid to the signer
    pub fn withdraw_payload(&self, secret_hash: &str, amount_octas: u64) -> EntryFunctionPayload {
        self.payload("withdraw", vec![hash_argument(secret_hash), amount_argument(amount_octas)])
    }

    /// `withdraw_direct<AptosCoin>(secret_hash, amount, recipient)`
    pub fn withdraw_direct_payload(
        &self,
        secret_hash: &str,
        amount_octas: u64,
        recipient: &str,
    ) -> EntryFunctionPayload {
        self.payload(
            "withdraw_direct",
            vec![
                hash_argument(secret_hash),
                amount_argument(amount_octas),
                Value::String(recipient.to_string()),
            ],
        )
    }

    /// `withdraw_via_relayer<AptosCoin>(secret_hash, amount, recipient)`
    pub fn withdraw_via_relayer_payload(
        &self,
        secret_hash: &str,
        amount_octas: u64,
        recipient: &str,
    ) -> EntryFunctionPayload {
        self.payload(
            "withdraw_via_relayer",
            vec![
                hash_argument(secret_hash),
                amount_argument(amount_octas),
                Value::String(recipient.to_string()),
            ],
        )
    }

    fn payload(&self, name: &str, arguments: Vec<Value>) -> EntryFunctionPayload {
        EntryFunctionPayload::new(self.function_id(name), vec![APTOS_COIN.to_string()], arguments)
    }
}

/// `vector<u8>` arguments travel as 0x-prefixed hex
fn hash_argument(secret_hash: &str) -> Value {
    let hex = secret_hash.strip_prefix("0x").unwrap_or(secret_hash);
    Value::String(format!("0x{}", hex))
}

/// `u64` arguments travel as decimal strings
fn amount_argument(octas: u64) -> Value {
    Value::String(octas.to_string())
}
