//! Pool-wide statistics for the landing page.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::HISTORY_LIMIT;
use crate::aptos::{AptosResult, ChainReader, Transaction};
use crate::pool::{apt_to_octas, octas_to_apt, PrivacyPool, APTOS_COIN, DENOMINATIONS};

/// A pool counts as active above this balance, in APT
const ACTIVE_POOL_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenominationStats {
    pub denomination: f64,
    pub balance: f64,
    pub active_deposits: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    pub total_value_locked: f64,
    pub active_pools: u64,
    pub total_deposits: u64,
    pub total_withdrawals: u64,
    pub pool_stats: Vec<DenominationStats>,
    pub users_served: u64,
}

impl PoolStats {
    /// All zeros, one row per denomination
    pub fn empty() -> Self {
        Self {
            total_value_locked: 0.0,
            active_pools: 0,
            total_deposits: 0,
            total_withdrawals: 0,
            pool_stats: DENOMINATIONS
                .iter()
                .map(|&denomination| DenominationStats {
                    denomination,
                    balance: 0.0,
                    active_deposits: 0,
                })
                .collect(),
            users_served: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.total_deposits == 0 && self.total_withdrawals == 0 && self.total_value_locked <= 0.0
    }
}

/// Statistics from the module account's history and its APT balance
pub fn summarize_pool(transactions: &[Transaction], balance_octas: u64) -> PoolStats {
    let mut total_deposits = 0u64;
    let mut total_withdrawals = 0u64;
    let mut withdrawers = HashSet::new();
    let mut per_denomination = [0u64; DENOMINATIONS.len()];

    for tx in transactions.iter().filter(|tx| tx.succeeded()) {
        let function = match tx.function() {
            Some(f) => f,
            None => continue,
        };

        if function.contains("deposit") {
            total_deposits += 1;
            if let Some(amount) = tx.argument_u64(1) {
                if let Some(slot) = DENOMINATIONS
                    .iter()
                    .position(|d| apt_to_octas(*d) == Some(amount))
                {
                    per_denomination[slot] += 1;
                }
            }
        } else if function.contains("withdraw") {
            total_withdrawals += 1;
            if let Some(sender) = &tx.sender {
                withdrawers.insert(sender.as_str());
            }
        }
    }

    let total_value_locked = octas_to_apt(balance_octas);
    let pool_stats: Vec<DenominationStats> = DENOMINATIONS
        .iter()
        .zip(per_denomination)
        .map(|(&denomination, active_deposits)| DenominationStats {
            denomination,
            balance: (active_deposits as f64 * denomination).min(total_value_locked),
            active_deposits,
        })
        .collect();
    let active_pools = pool_stats
        .iter()
        .filter(|row| row.balance > ACTIVE_POOL_THRESHOLD)
        .count() as u64;

    PoolStats {
        total_value_locked,
        active_pools,
        total_deposits,
        total_withdrawals,
        pool_stats,
        users_served: (withdrawers.len() as u64).max(total_withdrawals),
    }
}

async fn load(reader: &dyn ChainReader, pool: &PrivacyPool) -> AptosResult<PoolStats> {
    let module = pool.module_address();
    if !reader.resource_exists(module, &pool.mixer_resource_type()).await? {
        log::info!("Mixer resource not found at {}, pool not initialised", module);
        return Ok(PoolStats::empty());
    }

    let transactions = reader.account_transactions(module, HISTORY_LIMIT).await?;
    let balance = reader.coin_balance(module, APTOS_COIN).await?;
    log::debug!("Pool stats from {} transactions, balance {} octas", transactions.len(), balance);

    Ok(summarize_pool(&transactions, balance))
}

/// Never fails: chain errors fall back to [`PoolStats::empty`]
pub async fn fetch_pool_stats(reader: &dyn ChainReader, pool: &PrivacyPool) -> PoolStats {
    match load(reader, pool).await {
        Ok(stats) if !stats.is_empty() => stats,
        Ok(_) => PoolStats::empty(),
        Err(e) => {
            log::error!("Error fetching pool stats: {}", e);
            PoolStats::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{user_tx, MockChain, MODULE};

    fn deposit(version: u64, sender: &str, octas: &str) -> Transaction {
        user_tx(
            version,
            sender,
            &format!("{}::privacy_pool::deposit", MODULE),
            &["0xab", octas],
            1_700_000_000_000_000,
        )
    }

    fn withdraw(version: u64, sender: &str) -> Transaction {
        user_tx(
            version,
            sender,
            &format!("{}::privacy_pool::withdraw_via_relayer", MODULE),
            &["0xab", "100000000", "0x2"],
            1_700_000_000_000_000,
        )
    }

    #[test]
    fn test_counts_per_denomination() {
        let mut failed = deposit(5, "0xa", "100000000");
        failed.success = Some(false);

        let txs = vec![
            deposit(1, "0xa", "10000000"),
            deposit(2, "0xb", "100000000"),
            deposit(3, "0xc", "100000000"),
            deposit(4, "0xd", "12345"),
            failed,
            withdraw(6, "0xr"),
            withdraw(7, "0xr"),
        ];
        let stats = summarize_pool(&txs, 150_000_000);

        assert_eq!(stats.total_deposits, 4);
        assert_eq!(stats.total_withdrawals, 2);
        // One relayer sent both withdrawals
        assert_eq!(stats.users_served, 2);
        assert_eq!(stats.total_value_locked, 1.5);

        let counts: Vec<u64> = stats.pool_stats.iter().map(|r| r.active_deposits).collect();
        assert_eq!(counts, vec![1, 2, 0, 0]);
        assert!((stats.pool_stats[0].balance - 0.1).abs() < 1e-9);
        // Capped by the locked value
        assert_eq!(stats.pool_stats[1].balance, 1.5);
        assert_eq!(stats.active_pools, 2);
    }

    #[test]
    fn test_dust_pool_is_inactive() {
        let stats = summarize_pool(&[deposit(1, "0xa", "10000000")], 500_000);
        assert_eq!(stats.pool_stats[0].balance, 0.005);
        assert_eq!(stats.active_pools, 0);
    }

    #[tokio::test]
    async fn test_missing_mixer_is_zeroed() {
        let mut chain = MockChain::default();
        chain.mixer_exists = false;
        chain.transactions = vec![deposit(1, "0xa", "100000000")];
        chain.balance = 100_000_000;

        let stats = fetch_pool_stats(&chain, &PrivacyPool::new(MODULE)).await;
        assert_eq!(stats, PoolStats::empty());
        assert_eq!(stats.pool_stats.len(), 4);
    }

    #[tokio::test]
    async fn test_reader_failure_is_zeroed() {
        let mut chain = MockChain::default();
        chain.reader_down = true;
        let stats = fetch_pool_stats(&chain, &PrivacyPool::new(MODULE)).await;
        assert_eq!(stats, PoolStats::empty());
    }

    #[tokio::test]
    async fn test_live_stats() {
        let mut chain = MockChain::default();
        chain.transactions = vec![deposit(1, "0xa", "1000000000"), withdraw(2, "0xr")];
        chain.balance = 1_000_000_000;

        let stats = fetch_pool_stats(&chain, &PrivacyPool::new(MODULE)).await;
        assert_eq!(stats.total_deposits, 1);
        assert_eq!(stats.pool_stats[2].active_deposits, 1);
        assert_eq!(stats.pool_stats[2].balance, 10.0);
        assert_eq!(stats.active_pools, 1);
    }
}
