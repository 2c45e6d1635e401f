//! Per-address analytics
//!
//! Two views over an account's recent history: how it used the privacy
//! pool (`PrivacyStats`) and how the rest of the wallet behaves
//! (`WalletStats`). Pool transactions are left out of the wallet volume and
//! interaction figures so the dashboard does not link deposits to ordinary
//! transfers.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{from_micros, iso_timestamp, HISTORY_LIMIT};
use crate::aptos::{ChainReader, Transaction};
use crate::pool::{denomination_for, octas_to_apt, PrivacyPool};
use crate::validation::is_account_address;

/// Transactions listed in the wallet view
pub const RECENT_LIMIT: usize = 20;
const TOP_INTERACTIONS: usize = 5;
/// Reported when the account never touched the pool
pub const NO_ACTIVITY_DAYS: i64 = 999;
const HIDDEN: &str = "Hidden for privacy";
const DISCLAIMER: &str =
    "This data is generated for personal use only. FlowShield does not store this information.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolUsage {
    /// APT
    pub denomination: f64,
    pub count: u64,
    /// Integer share of this account's deposits
    pub percentage: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyStats {
    pub total_deposits: u64,
    pub total_withdrawals: u64,
    pub deposits_this_month: u64,
    pub total_mixed: f64,
    pub average_anonymity_set: u64,
    pub days_since_last_activity: i64,
    pub pool_usage: Vec<PoolUsage>,
    pub privacy_score: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    Transfer,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionData {
    pub hash: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub success: bool,
    pub is_flow_shield: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_denomination: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInteraction {
    pub address: String,
    pub transaction_count: u64,
    pub total_value: f64,
    pub last_interaction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStats {
    pub total_transactions: u64,
    pub total_volume: f64,
    pub unique_addresses: u64,
    pub most_active_address: String,
    pub average_transaction_value: f64,
    /// Transactions per week
    pub transaction_frequency: f64,
    pub recent_transactions: Vec<TransactionData>,
    pub top_interactions: Vec<AddressInteraction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalytics {
    pub address: String,
    pub privacy_stats: PrivacyStats,
    pub wallet_stats: WalletStats,
    pub last_updated: String,
}

impl UserAnalytics {
    /// Zeroed analytics, returned when the history cannot be fetched
    pub fn empty(address: &str, now: DateTime<Utc>) -> Self {
        Self {
            address: address.to_string(),
            privacy_stats: PrivacyStats::default(),
            wallet_stats: WalletStats::default(),
            last_updated: iso_timestamp(now),
        }
    }
}

fn is_pool_tx(tx: &Transaction, pool: &PrivacyPool) -> bool {
    tx.is_user_transaction() && tx.function().map_or(false, |f| pool.is_pool_function(f))
}

fn function_contains(tx: &Transaction, needle: &str) -> bool {
    tx.function().map_or(false, |f| f.contains(needle))
}

fn amount_apt(tx: &Transaction) -> Option<f64> {
    tx.argument_u64(1).map(octas_to_apt)
}

/// Pool usage of one account. `transactions` must be newest first.
pub fn analyze_privacy(
    transactions: &[Transaction],
    pool: &PrivacyPool,
    now: DateTime<Utc>,
) -> PrivacyStats {
    let pool_txs: Vec<&Transaction> = transactions.iter().filter(|tx| is_pool_tx(tx, pool)).collect();
    let deposits: Vec<&Transaction> = pool_txs
        .iter()
        .copied()
        .filter(|tx| function_contains(tx, "deposit"))
        .collect();
    let total_withdrawals = pool_txs
        .iter()
        .filter(|tx| function_contains(tx, "withdraw"))
        .count() as u64;

    // Keyed by octas so equal amounts group exactly
    let mut usage: BTreeMap<u64, u64> = BTreeMap::new();
    for tx in &deposits {
        if let Some(octas) = tx.argument_u64(1) {
            *usage.entry(octas).or_default() += 1;
        }
    }
    let pool_usage: Vec<PoolUsage> = usage
        .iter()
        .map(|(&octas, &count)| PoolUsage {
            denomination: octas_to_apt(octas),
            count,
            percentage: (count as f64 / deposits.len() as f64 * 100.0).round() as u64,
        })
        .collect();

    let days_since_last_activity = pool_txs
        .first()
        .and_then(|tx| tx.timestamp_micros())
        .and_then(from_micros)
        .map(|last| (now - last).num_days())
        .unwrap_or(NO_ACTIVITY_DAYS);

    let month_ago = now - Duration::days(30);
    let deposits_this_month = deposits
        .iter()
        .filter_map(|tx| tx.timestamp_micros().and_then(from_micros))
        .filter(|time| *time > month_ago)
        .count() as u64;

    let total_mixed: f64 = deposits.iter().filter_map(|tx| amount_apt(tx)).sum();

    let average_anonymity_set = if pool_usage.is_empty() {
        0
    } else {
        let total: u64 = pool_usage.iter().map(|p| p.count).sum();
        (total as f64 / pool_usage.len() as f64 * 10.0).round() as u64
    };

    let privacy_score = if deposits.is_empty() {
        0
    } else {
        let points = (deposits.len() as u64).min(10) * 5
            + average_anonymity_set.min(20) * 2
            + (pool_usage.len() as u64).min(2) * 5;
        points.min(100)
    };

    PrivacyStats {
        total_deposits: deposits.len() as u64,
        total_withdrawals,
        deposits_this_month,
        total_mixed,
        average_anonymity_set,
        days_since_last_activity,
        pool_usage,
        privacy_score,
    }
}

fn classify(tx: &Transaction, pool: &PrivacyPool) -> TransactionData {
    let is_flow_shield = is_pool_tx(tx, pool);

    let (kind, amount, counterparty) = if is_flow_shield {
        let kind = if function_contains(tx, "deposit") {
            TransactionType::Deposit
        } else if function_contains(tx, "withdraw") {
            TransactionType::Withdraw
        } else {
            TransactionType::Other
        };
        // withdraw_direct and withdraw_via_relayer carry the recipient third
        let recipient = tx.argument(2).filter(|a| is_account_address(a));
        (kind, amount_apt(tx).unwrap_or(0.0), recipient)
    } else if function_contains(tx, "transfer") {
        // 0x1::aptos_account::transfer(to, amount) and coin::transfer
        (TransactionType::Transfer, amount_apt(tx).unwrap_or(0.0), counterparty(tx, pool))
    } else {
        (TransactionType::Other, 0.0, None)
    };

    let pool_denomination = match kind {
        TransactionType::Deposit | TransactionType::Withdraw => {
            tx.argument_u64(1).and_then(denomination_for)
        }
        _ => None,
    };

    TransactionData {
        hash: tx.hash.clone(),
        timestamp: tx
            .timestamp_micros()
            .and_then(from_micros)
            .map(iso_timestamp)
            .unwrap_or_default(),
        kind,
        amount,
        success: tx.succeeded(),
        is_flow_shield,
        counterparty,
        pool_denomination,
    }
}

/// Recipient of an ordinary transfer. Other calls carry arguments that only
/// look like addresses (`publish_package_txn` metadata, hashes), so they have
/// no counterparty.
fn counterparty(tx: &Transaction, pool: &PrivacyPool) -> Option<String> {
    if is_pool_tx(tx, pool) || !function_contains(tx, "transfer") {
        return None;
    }
    tx.argument(0).filter(|a| is_account_address(a))
}

/// Transactions per week across the observed span, at least one week
fn weekly_frequency(transactions: &[Transaction]) -> f64 {
    let times: Vec<DateTime<Utc>> = transactions
        .iter()
        .filter_map(|tx| tx.timestamp_micros().and_then(from_micros))
        .collect();
    let (newest, oldest) = match (times.iter().max(), times.iter().min()) {
        (Some(newest), Some(oldest)) => (*newest, *oldest),
        _ => return 0.0,
    };
    let week = Duration::weeks(1).num_seconds() as f64;
    let weeks = ((newest - oldest).num_seconds() as f64 / week).max(1.0);
    transactions.len() as f64 / weeks
}

fn label_for(address: &str) -> Option<String> {
    match address {
        "0x1" => Some("Aptos Framework".to_string()),
        _ => None,
    }
}

/// General wallet activity. `transactions` must be newest first.
pub fn analyze_wallet(transactions: &[Transaction], pool: &PrivacyPool) -> WalletStats {
    let recent_transactions: Vec<TransactionData> = transactions
        .iter()
        .take(RECENT_LIMIT)
        .map(|tx| classify(tx, pool))
        .collect();

    let public: Vec<&TransactionData> = recent_transactions
        .iter()
        .filter(|tx| !tx.is_flow_shield)
        .collect();
    let total_volume: f64 = public.iter().map(|tx| tx.amount).sum();
    let average_transaction_value = if public.is_empty() {
        0.0
    } else {
        total_volume / public.len() as f64
    };

    // First-seen order breaks ties, so the newest wins among equals
    let mut seen: Vec<String> = Vec::new();
    let mut counts: HashMap<String, u64> = HashMap::new();
    for address in transactions.iter().filter_map(|tx| counterparty(tx, pool)) {
        let count = counts.entry(address.clone()).or_default();
        if *count == 0 {
            seen.push(address);
        }
        *count += 1;
    }
    let most_active_address = seen
        .iter()
        .fold(None::<&String>, |best, address| match best {
            Some(b) if counts[b] >= counts[address] => Some(b),
            _ => Some(address),
        })
        .cloned()
        .unwrap_or_default();

    let mut interactions: Vec<AddressInteraction> = Vec::new();
    for tx in public.iter().filter(|tx| tx.kind == TransactionType::Transfer) {
        let address = match &tx.counterparty {
            Some(a) => a,
            None => continue,
        };
        match interactions.iter_mut().find(|i| &i.address == address) {
            Some(existing) => {
                existing.transaction_count += 1;
                existing.total_value += tx.amount;
            }
            None => interactions.push(AddressInteraction {
                address: address.clone(),
                transaction_count: 1,
                total_value: tx.amount,
                last_interaction: tx.timestamp.clone(),
                label: label_for(address),
            }),
        }
    }
    // Stable sort keeps newest-first order among equals
    interactions.sort_by(|a, b| b.transaction_count.cmp(&a.transaction_count));
    interactions.truncate(TOP_INTERACTIONS);

    WalletStats {
        total_transactions: transactions.len() as u64,
        total_volume,
        unique_addresses: seen.len() as u64,
        most_active_address,
        average_transaction_value,
        transaction_frequency: weekly_frequency(transactions),
        recent_transactions,
        top_interactions: interactions,
    }
}

/// Analytics for `address`. Never fails: fetch errors give zeroed analytics.
pub async fn fetch_user_analytics(
    reader: &dyn ChainReader,
    pool: &PrivacyPool,
    address: &str,
    now: DateTime<Utc>,
) -> UserAnalytics {
    let mut transactions = match reader.account_transactions(address, HISTORY_LIMIT).await {
        Ok(txs) => txs,
        Err(e) => {
            log::error!("Error fetching user analytics for {}: {}", address, e);
            return UserAnalytics::empty(address, now);
        }
    };
    log::debug!("Found {} transactions for {}", transactions.len(), address);

    transactions.sort_by(|a, b| b.version_number().cmp(&a.version_number()));

    UserAnalytics {
        address: address.to_string(),
        privacy_stats: analyze_privacy(&transactions, pool, now),
        wallet_stats: analyze_wallet(&transactions, pool),
        last_updated: iso_timestamp(now),
    }
}

/// Pretty JSON export. Recent transactions and interactions are replaced by
/// a placeholder unless `include_private` is set.
pub fn export_user_data(
    analytics: &UserAnalytics,
    include_private: bool,
    now: DateTime<Utc>,
) -> serde_json::Result<String> {
    let mut wallet_stats = serde_json::to_value(&analytics.wallet_stats)?;
    if !include_private {
        if let Value::Object(fields) = &mut wallet_stats {
            fields.insert("recentTransactions".into(), Value::String(HIDDEN.into()));
            fields.insert("topInteractions".into(), Value::String(HIDDEN.into()));
        }
    }

    let export = json!({
        "exportDate": iso_timestamp(now),
        "address": analytics.address,
        "privacyStats": analytics.privacy_stats,
        "walletStats": wallet_stats,
        "disclaimer": DISCLAIMER,
    });
    serde_json::to_string_pretty(&export)
}
