//! TokenPool Event Decoding
//!
//! Typed views over the pool's events. Transfer receipts are scanned for
//! `TokensSent` to report what the pool actually accepted.

use alloy::primitives::{Address, Log, U256};
use alloy::sol_types::SolEvent;
use tracing::debug;

use crate::evm::contracts::TokenPool;

/// TokensSent(address indexed token, address indexed from, address indexed to,
///            uint256 amount, uint16 dstChainId)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokensSentEvent {
    /// Pool that emitted the event
    pub pool: Address,
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    /// Messaging-layer destination chain
    pub dst_chain_id: u16,
}

/// TokensReceived(address indexed token, address indexed from, address indexed to,
///                uint256 amount, uint16 srcChainId)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokensReceivedEvent {
    pub pool: Address,
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub src_chain_id: u16,
}

/// Any event emitted by a TokenPool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    TokensSent(TokensSentEvent),
    TokensReceived(TokensReceivedEvent),
    BaseFeeUpdated { pool: Address, new_fee_percent: U256 },
    Paused { pool: Address, account: Address },
}

impl PoolEvent {
    /// Decode a raw log; `None` for logs that are not pool events
    pub fn decode(log: &Log) -> Option<Self> {
        let topic0 = *log.data.topics().first()?;
        let pool = log.address;

        let decoded = if topic0 == TokenPool::TokensSent::SIGNATURE_HASH {
            TokenPool::TokensSent::decode_log_data(&log.data, true).map(|e| {
                PoolEvent::TokensSent(TokensSentEvent {
                    pool,
                    token: e.token,
                    from: e.from,
                    to: e.to,
                    amount: e.amount,
                    dst_chain_id: e.dstChainId,
                })
            })
        } else if topic0 == TokenPool::TokensReceived::SIGNATURE_HASH {
            TokenPool::TokensReceived::decode_log_data(&log.data, true).map(|e| {
                PoolEvent::TokensReceived(TokensReceivedEvent {
                    pool,
                    token: e.token,
                    from: e.from,
                    to: e.to,
                    amount: e.amount,
                    src_chain_id: e.srcChainId,
                })
            })
        } else if topic0 == TokenPool::BaseFeeUpdated::SIGNATURE_HASH {
            TokenPool::BaseFeeUpdated::decode_log_data(&log.data, true).map(|e| {
                PoolEvent::BaseFeeUpdated {
                    pool,
                    new_fee_percent: e.newFeePercent,
                }
            })
        } else if topic0 == TokenPool::Paused::SIGNATURE_HASH {
            TokenPool::Paused::decode_log_data(&log.data, true).map(|e| PoolEvent::Paused {
                pool,
                account: e.account,
            })
        } else {
            return None;
        };

        match decoded {
            Ok(event) => Some(event),
            Err(e) => {
                debug!(pool = %pool, error = %e, "Log matched a pool event signature but failed to decode");
                None
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::TokensSent(_) => "TokensSent",
            PoolEvent::TokensReceived(_) => "TokensReceived",
            PoolEvent::BaseFeeUpdated { .. } => "BaseFeeUpdated",
            PoolEvent::Paused { .. } => "Paused",
        }
    }
}

/// First `TokensSent` event emitted by `pool` among `logs`
pub fn find_tokens_sent(logs: &[Log], pool: Address) -> Option<TokensSentEvent> {
    logs.iter()
        .filter(|log| log.address == pool)
        .find_map(|log| match PoolEvent::decode(log)? {
            PoolEvent::TokensSent(event) => Some(event),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, B256};

    const POOL: Address = address!("94Ef82A7e76D07249af7314122F54a0568D7c11c");
    const TOKEN: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
    const ALICE: Address = address!("1111111111111111111111111111111111111111");
    const BOB: Address = address!("2222222222222222222222222222222222222222");

    fn tokens_sent_log(emitter: Address) -> Log {
        let event = TokenPool::TokensSent {
            token: TOKEN,
            from: ALICE,
            to: BOB,
            amount: U256::from(1_000_000_000u64),
            dstChainId: 101,
        };
        Log {
            address: emitter,
            data: event.encode_log_data(),
        }
    }

    #[test]
    fn test_decode_tokens_sent() {
        let event = PoolEvent::decode(&tokens_sent_log(POOL)).unwrap();
        assert_eq!(event.name(), "TokensSent");
        assert_eq!(
            event,
            PoolEvent::TokensSent(TokensSentEvent {
                pool: POOL,
                token: TOKEN,
                from: ALICE,
                to: BOB,
                amount: U256::from(1_000_000_000u64),
                dst_chain_id: 101,
            })
        );
    }

    #[test]
    fn test_decode_paused() {
        let log = Log {
            address: POOL,
            data: TokenPool::Paused { account: ALICE }.encode_log_data(),
        };
        assert_eq!(
            PoolEvent::decode(&log),
            Some(PoolEvent::Paused {
                pool: POOL,
                account: ALICE
            })
        );
    }

    #[test]
    fn test_decode_ignores_foreign_logs() {
        let mut log = tokens_sent_log(POOL);
        log.data = alloy::primitives::LogData::new_unchecked(vec![B256::with_last_byte(1)], Default::default());
        assert!(PoolEvent::decode(&log).is_none());

        let empty = Log {
            address: POOL,
            data: Default::default(),
        };
        assert!(PoolEvent::decode(&empty).is_none());
    }

    #[test]
    fn test_find_tokens_sent_filters_by_pool() {
        let other_pool = address!("Ee3aA54b931c5Fc0F986D3E7380809f16762A4a9");
        let logs = vec![tokens_sent_log(other_pool), tokens_sent_log(POOL)];

        let found = find_tokens_sent(&logs, POOL).unwrap();
        assert_eq!(found.pool, POOL);
        assert_eq!(found.to, BOB);

        assert!(find_tokens_sent(&logs[..1], POOL).is_none());
    }
}
