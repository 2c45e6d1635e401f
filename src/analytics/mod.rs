//! Pool and user analytics
//!
//! Derived from recent on-chain transaction history. Every figure is computed
//! from observed transactions; a fetch failure yields zeroed statistics
//! rather than an error.

use chrono::{DateTime, SecondsFormat, Utc};

pub mod stats;
pub mod user;

pub use stats::{fetch_pool_stats, summarize_pool, DenominationStats, PoolStats};
pub use user::{
    analyze_privacy, analyze_wallet, export_user_data, fetch_user_analytics, AddressInteraction,
    PoolUsage, PrivacyStats, TransactionData, TransactionType, UserAnalytics, WalletStats,
};

/// Transactions examined per account
pub const HISTORY_LIMIT: u16 = 100;

/// ISO-8601 with milliseconds and a `Z` suffix
pub fn iso_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fullnode timestamps are microseconds since the epoch
pub fn from_micros(micros: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(micros / 1_000_000).ok()?;
    let nanos = ((micros % 1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos)
}
