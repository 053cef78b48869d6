//! Admin dashboard state
//!
//! Pools, fee schedules and the transaction log shown on the admin
//! dashboard. Everything here lives in memory: mutations change the local
//! view only and never reach a contract. The store is seeded with the
//! deployment's reference data and loses all changes on restart.

use std::collections::HashMap;
use std::str::FromStr;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Duration, Utc};
use fibswap_core::NetworkRegistry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminError {
    #[error("Pool {0} not found")]
    PoolNotFound(u32),

    #[error("Fee schedule {0} not found")]
    FeeNotFound(u32),

    #[error("Transaction {0} not found")]
    TransactionNotFound(u32),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Insufficient pool balance: {balance} available, {requested} requested")]
    InsufficientBalance {
        balance: BigDecimal,
        requested: BigDecimal,
    },

    #[error("Fee {value}% is outside the 0-100% range")]
    FeeOutOfRange { value: BigDecimal },

    #[error("Invalid decimal '{value}': {reason}")]
    InvalidDecimal { value: String, reason: &'static str },
}

/// Most fractional digits accepted in an admin amount or percentage
pub const MAX_DECIMAL_SCALE: i64 = 18;

/// Most significant digits accepted in an admin amount or percentage
pub const MAX_DECIMAL_DIGITS: usize = 40;

/// Parse a plain decimal such as `"2500.5"`
///
/// Exponent notation is refused and the size is capped, so every value that
/// reaches the store has a small, bounded representation.
pub fn parse_decimal(value: &str) -> Result<BigDecimal, AdminError> {
    let invalid = |reason| AdminError::InvalidDecimal {
        value: value.chars().take(64).collect(),
        reason,
    };

    let trimmed = value.trim();
    // sign and decimal point on top of the digits
    if trimmed.len() > MAX_DECIMAL_DIGITS + 2 {
        return Err(invalid("too many digits"));
    }
    if trimmed.contains(['e', 'E']) {
        return Err(invalid("exponent notation is not accepted"));
    }

    let parsed = BigDecimal::from_str(trimmed).map_err(|_| invalid("not a decimal number"))?;
    let (digits, scale) = parsed.as_bigint_and_exponent();
    if scale > MAX_DECIMAL_SCALE {
        return Err(invalid("too many decimal places"));
    }
    if digits.magnitude().to_string().len() > MAX_DECIMAL_DIGITS {
        return Err(invalid("too many digits"));
    }
    Ok(parsed)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolRecord {
    pub id: u32,
    /// Network key
    pub network: String,
    pub token: String,
    /// Pool contract address (checksummed)
    pub address: String,
    pub balance: BigDecimal,
    pub max_swap_amount: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeRecord {
    pub id: u32,
    pub network: String,
    pub token: String,
    pub base_fee_percent: BigDecimal,
    pub discounted_fee_percent: BigDecimal,
    pub messaging_fee_percent: BigDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Completed,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub id: u32,
    /// Transaction hash, unknown for imported history
    pub hash: Option<String>,
    pub source: String,
    pub destination: String,
    pub token: String,
    pub amount: BigDecimal,
    pub status: TxStatus,
    pub created_at: DateTime<Utc>,
}

/// A transaction to append to the log
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub hash: Option<String>,
    pub source: String,
    pub destination: String,
    pub token: String,
    pub amount: BigDecimal,
    pub status: TxStatus,
}

/// Per-network aggregate shown on the statistics dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub network: String,
    /// Sum of pool balances on the network
    pub balance: BigDecimal,
    /// Sum of completed transfers sent from the network
    pub total_volume: BigDecimal,
    /// Base fees earned on those transfers
    pub fees_collected: BigDecimal,
    /// All transfers sent from the network, any status
    pub transaction_count: usize,
}

#[derive(Debug, Clone)]
pub struct AdminStore {
    pools: Vec<PoolRecord>,
    fees: Vec<FeeRecord>,
    transactions: Vec<TransactionRecord>,
    next_tx_id: u32,
}

/// `units * 10^-scale`
fn dec(units: i64, scale: i64) -> BigDecimal {
    BigDecimal::new(BigInt::from(units), scale)
}

fn hundred() -> BigDecimal {
    BigDecimal::from(100u32)
}

impl AdminStore {
    pub fn new(
        pools: Vec<PoolRecord>,
        fees: Vec<FeeRecord>,
        transactions: Vec<TransactionRecord>,
    ) -> Self {
        let next_tx_id = transactions.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Self {
            pools,
            fees,
            transactions,
            next_tx_id,
        }
    }

    /// Reference data for the networks present in `registry`
    pub fn seeded(registry: &NetworkRegistry) -> Self {
        let pool_address = |key: &str| {
            registry
                .get(key)
                .map(|n| n.pool_address.to_string())
        };

        let pool_seeds = [
            (1, "ethereum", "USDC", 1_000_000u64, 100_000u64),
            (2, "ethereum", "USDT", 500_000, 50_000),
            (3, "polygon", "USDC", 750_000, 75_000),
            (4, "bsc", "USDC", 1_250_000, 125_000),
        ];
        let pools = pool_seeds
            .iter()
            .filter_map(|&(id, network, token, balance, max_swap)| {
                Some(PoolRecord {
                    id,
                    network: network.to_string(),
                    token: token.to_string(),
                    address: pool_address(network)?,
                    balance: BigDecimal::from(balance),
                    max_swap_amount: BigDecimal::from(max_swap),
                })
            })
            .collect();

        // percentages: (units, scale)
        let fee_seeds = [
            (1, "ethereum", "USDC", (1, 1), (8, 2), (5, 2)),
            (2, "ethereum", "USDT", (1, 1), (8, 2), (5, 2)),
            (3, "polygon", "USDC", (15, 2), (12, 2), (7, 2)),
            (4, "bsc", "USDC", (12, 2), (1, 1), (6, 2)),
        ];
        let fees = fee_seeds
            .iter()
            .filter(|(_, network, ..)| registry.get(network).is_some())
            .map(|&(id, network, token, base, discounted, messaging)| FeeRecord {
                id,
                network: network.to_string(),
                token: token.to_string(),
                base_fee_percent: dec(base.0, base.1),
                discounted_fee_percent: dec(discounted.0, discounted.1),
                messaging_fee_percent: dec(messaging.0, messaging.1),
            })
            .collect();

        let now = Utc::now();
        let tx_seeds = [
            (1, "ethereum", "polygon", "USDC", 1000u64, TxStatus::Completed),
            (2, "bsc", "ethereum", "USDC", 500, TxStatus::Pending),
            (3, "ethereum", "bsc", "USDT", 750, TxStatus::Completed),
            (4, "polygon", "ethereum", "USDC", 250, TxStatus::Failed),
        ];
        let transactions = tx_seeds
            .iter()
            .map(
                |&(id, source, destination, token, amount, status)| TransactionRecord {
                    id,
                    hash: None,
                    source: source.to_string(),
                    destination: destination.to_string(),
                    token: token.to_string(),
                    amount: BigDecimal::from(amount),
                    status,
                    created_at: now - Duration::hours(i64::from(5 - id)),
                },
            )
            .collect();

        Self::new(pools, fees, transactions)
    }

    pub fn pools(&self) -> &[PoolRecord] {
        &self.pools
    }

    pub fn pool(&self, id: u32) -> Result<&PoolRecord, AdminError> {
        self.pools
            .iter()
            .find(|p| p.id == id)
            .ok_or(AdminError::PoolNotFound(id))
    }

    fn pool_mut(&mut self, id: u32) -> Result<&mut PoolRecord, AdminError> {
        self.pools
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AdminError::PoolNotFound(id))
    }

    pub fn add_liquidity(&mut self, id: u32, amount: &BigDecimal) -> Result<&PoolRecord, AdminError> {
        require_positive(amount)?;
        let pool = self.pool_mut(id)?;
        pool.balance += amount;
        info!(pool = id, amount = %amount, balance = %pool.balance, "Liquidity added");
        Ok(&*pool)
    }

    pub fn remove_liquidity(
        &mut self,
        id: u32,
        amount: &BigDecimal,
    ) -> Result<&PoolRecord, AdminError> {
        require_positive(amount)?;
        let pool = self.pool_mut(id)?;
        if *amount > pool.balance {
            return Err(AdminError::InsufficientBalance {
                balance: pool.balance.clone(),
                requested: amount.clone(),
            });
        }
        pool.balance -= amount;
        info!(pool = id, amount = %amount, balance = %pool.balance, "Liquidity removed");
        Ok(&*pool)
    }

    pub fn update_max_swap(
        &mut self,
        id: u32,
        amount: &BigDecimal,
    ) -> Result<&PoolRecord, AdminError> {
        require_positive(amount)?;
        let pool = self.pool_mut(id)?;
        pool.max_swap_amount = amount.clone();
        info!(pool = id, max_swap_amount = %amount, "Max swap amount updated");
        Ok(&*pool)
    }

    pub fn fees(&self) -> &[FeeRecord] {
        &self.fees
    }

    pub fn update_fees(
        &mut self,
        id: u32,
        base_fee_percent: &BigDecimal,
        discounted_fee_percent: &BigDecimal,
    ) -> Result<&FeeRecord, AdminError> {
        require_percentage(base_fee_percent)?;
        require_percentage(discounted_fee_percent)?;

        let fee = self
            .fees
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(AdminError::FeeNotFound(id))?;
        fee.base_fee_percent = base_fee_percent.clone();
        fee.discounted_fee_percent = discounted_fee_percent.clone();

        info!(
            fee = id,
            base = %base_fee_percent,
            discounted = %discounted_fee_percent,
            "Fee schedule updated"
        );
        Ok(&*fee)
    }

    /// Transaction log, newest first
    pub fn transactions(&self) -> Vec<&TransactionRecord> {
        let mut txs: Vec<_> = self.transactions.iter().collect();
        txs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        txs
    }

    pub fn record_transaction(&mut self, tx: NewTransaction) -> &TransactionRecord {
        let id = self.next_tx_id;
        self.next_tx_id += 1;

        debug!(id, hash = ?tx.hash, status = ?tx.status, "Recording transaction");

        self.transactions.push(TransactionRecord {
            id,
            hash: tx.hash,
            source: tx.source,
            destination: tx.destination,
            token: tx.token,
            amount: tx.amount,
            status: tx.status,
            created_at: Utc::now(),
        });
        &self.transactions[self.transactions.len() - 1]
    }

    /// Settle a logged transfer, e.g. a `Pending` one once its outcome is known
    pub fn set_status(&mut self, id: u32, status: TxStatus) -> Result<&TransactionRecord, AdminError> {
        let tx = self
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AdminError::TransactionNotFound(id))?;

        info!(id, from = ?tx.status, to = ?status, "Transaction status updated");
        tx.status = status;
        Ok(&*tx)
    }

    /// Aggregate pools and transactions per network, in pool order
    pub fn pool_stats(&self) -> Vec<PoolStats> {
        let base_fees: HashMap<(&str, &str), &BigDecimal> = self
            .fees
            .iter()
            .map(|f| ((f.network.as_str(), f.token.as_str()), &f.base_fee_percent))
            .collect();

        let mut stats: Vec<PoolStats> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for pool in &self.pools {
            let idx = *index.entry(pool.network.as_str()).or_insert_with(|| {
                stats.push(PoolStats {
                    network: pool.network.clone(),
                    balance: BigDecimal::zero(),
                    total_volume: BigDecimal::zero(),
                    fees_collected: BigDecimal::zero(),
                    transaction_count: 0,
                });
                stats.len() - 1
            });
            stats[idx].balance += &pool.balance;
        }

        for tx in &self.transactions {
            let Some(&idx) = index.get(tx.source.as_str()) else {
                continue;
            };
            let entry = &mut stats[idx];
            entry.transaction_count += 1;

            if tx.status == TxStatus::Completed {
                entry.total_volume += &tx.amount;
                if let Some(pct) = base_fees.get(&(tx.source.as_str(), tx.token.as_str())) {
                    entry.fees_collected += &tx.amount * *pct / hundred();
                }
            }
        }

        stats
    }
}

fn require_positive(amount: &BigDecimal) -> Result<(), AdminError> {
    if *amount <= BigDecimal::zero() {
        return Err(AdminError::NonPositiveAmount);
    }
    Ok(())
}

fn require_percentage(value: &BigDecimal) -> Result<(), AdminError> {
    if *value < BigDecimal::zero() || *value > hundred() {
        return Err(AdminError::FeeOutOfRange {
            value: value.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AdminStore {
        AdminStore::seeded(&NetworkRegistry::mainnet())
    }

    fn d(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_decimal_plain_values() {
        assert_eq!(parse_decimal("2500.5").unwrap(), d("2500.5"));
        assert_eq!(parse_decimal(" 100 ").unwrap(), d("100"));
        assert_eq!(parse_decimal("0.000000000000000001").unwrap(), d("1e-18"));
        assert!(parse_decimal("-3").is_ok());
    }

    #[test]
    fn test_parse_decimal_rejects_exponents() {
        for input in ["1e-3000000", "1e9223372036854775807", "5E2", "1.5e3"] {
            let err = parse_decimal(input).unwrap_err();
            assert!(
                matches!(err, AdminError::InvalidDecimal { .. }),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_parse_decimal_caps_size() {
        let err = parse_decimal("0.0000000000000000001").unwrap_err();
        assert!(err.to_string().contains("too many decimal places"));

        let err = parse_decimal(&"9".repeat(41)).unwrap_err();
        assert!(err.to_string().contains("too many digits"));

        let err = parse_decimal(&"1".repeat(5000)).unwrap_err();
        assert!(err.to_string().contains("too many digits"));
        assert!(err.to_string().len() < 200);

        assert!(parse_decimal(&"9".repeat(40)).is_ok());
        assert!(parse_decimal("lots").is_err());
        assert!(parse_decimal("").is_err());
    }

    #[test]
    fn test_seed_uses_registry_pool_addresses() {
        let store = store();
        assert_eq!(store.pools().len(), 4);
        assert_eq!(store.fees().len(), 4);

        let polygon = store.pool(3).unwrap();
        assert_eq!(polygon.network, "polygon");
        assert_eq!(
            polygon.address,
            "0x94Ef82A7e76D07249af7314122F54a0568D7c11c"
        );
        assert_eq!(polygon.balance, d("750000"));
    }

    #[test]
    fn test_liquidity_add_and_remove() {
        let mut store = store();

        let pool = store.add_liquidity(1, &d("2500.5")).unwrap();
        assert_eq!(pool.balance, d("1002500.5"));

        let pool = store.remove_liquidity(1, &d("1002500.5")).unwrap();
        assert_eq!(pool.balance, d("0"));
    }

    #[test]
    fn test_remove_cannot_go_negative() {
        let mut store = store();

        let err = store.remove_liquidity(2, &d("500000.01")).unwrap_err();
        assert!(matches!(err, AdminError::InsufficientBalance { .. }));
        assert_eq!(store.pool(2).unwrap().balance, d("500000"));
    }

    #[test]
    fn test_rejects_non_positive_amounts_and_unknown_pools() {
        let mut store = store();

        assert_eq!(
            store.add_liquidity(1, &d("0")).unwrap_err(),
            AdminError::NonPositiveAmount
        );
        assert_eq!(
            store.update_max_swap(1, &d("-1")).unwrap_err(),
            AdminError::NonPositiveAmount
        );
        assert_eq!(
            store.add_liquidity(99, &d("1")).unwrap_err(),
            AdminError::PoolNotFound(99)
        );
    }

    #[test]
    fn test_update_max_swap() {
        let mut store = store();
        store.update_max_swap(4, &d("200000")).unwrap();
        assert_eq!(store.pool(4).unwrap().max_swap_amount, d("200000"));
    }

    #[test]
    fn test_update_fees_bounds() {
        let mut store = store();

        let fee = store.update_fees(3, &d("0.2"), &d("0.15")).unwrap();
        assert_eq!(fee.base_fee_percent, d("0.2"));
        assert_eq!(fee.discounted_fee_percent, d("0.15"));
        assert_eq!(fee.messaging_fee_percent, d("0.07"));

        assert!(matches!(
            store.update_fees(3, &d("100.1"), &d("1")),
            Err(AdminError::FeeOutOfRange { .. })
        ));
        assert!(matches!(
            store.update_fees(3, &d("1"), &d("-0.1")),
            Err(AdminError::FeeOutOfRange { .. })
        ));
        assert_eq!(
            store.update_fees(9, &d("1"), &d("1")).unwrap_err(),
            AdminError::FeeNotFound(9)
        );
    }

    #[test]
    fn test_transactions_newest_first() {
        let mut store = store();
        let ids: Vec<u32> = store.transactions().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);

        let recorded = store.record_transaction(NewTransaction {
            hash: Some("0xabc".to_string()),
            source: "ethereum".to_string(),
            destination: "bsc".to_string(),
            token: "USDC".to_string(),
            amount: d("12.5"),
            status: TxStatus::Pending,
        });
        assert_eq!(recorded.id, 5);

        assert_eq!(store.transactions()[0].id, 5);

        store.set_status(5, TxStatus::Completed).unwrap();
        assert_eq!(store.transactions()[0].status, TxStatus::Completed);
        assert_eq!(
            store.set_status(77, TxStatus::Failed).unwrap_err(),
            AdminError::TransactionNotFound(77)
        );
    }

    #[test]
    fn test_pool_stats() {
        let store = store();
        let stats = store.pool_stats();

        let networks: Vec<&str> = stats.iter().map(|s| s.network.as_str()).collect();
        assert_eq!(networks, vec!["ethereum", "polygon", "bsc"]);

        let eth = &stats[0];
        assert_eq!(eth.balance, d("1500000"));
        assert_eq!(eth.transaction_count, 2);
        assert_eq!(eth.total_volume, d("1750"));
        // 1000 USDC at 0.1% + 750 USDT at 0.1%
        assert_eq!(eth.fees_collected, d("1.75"));

        let polygon = &stats[1];
        assert_eq!(polygon.transaction_count, 1);
        assert_eq!(polygon.total_volume, d("0"));

        let bsc = &stats[2];
        assert_eq!(bsc.transaction_count, 1);
        assert_eq!(bsc.fees_collected, d("0"));
    }
}
