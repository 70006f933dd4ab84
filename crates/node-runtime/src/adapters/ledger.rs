//! # In-Memory Ledger
//!
//! Implements `BlockStore`, `TransactionPool` and `MultisigProcessor` over
//! one in-process chain. Admitted transactions and new signature shares are
//! published back on the bus so the transport relays them.

use async_trait::async_trait;
use parking_lot::RwLock;
use peer_transport::domain::{DispatchError, PoolError, StoreError};
use peer_transport::ports::outbound::{BlockStore, MultisigProcessor, TransactionPool};
use serde_json::Value;
use shared_bus::{EventPublisher, TransportEvent};
use shared_types::ledger::{Block, CommonBlock, SignatureShare, Transaction};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
struct State {
    /// Blocks ordered by height.
    chain: Vec<Block>,
    unconfirmed: Vec<Transaction>,
}

/// Chain and unconfirmed pool held in process memory.
pub struct InMemoryLedger {
    state: RwLock<State>,
    events: Arc<dyn EventPublisher>,
}

impl InMemoryLedger {
    pub fn new(events: Arc<dyn EventPublisher>) -> Self {
        Self {
            state: RwLock::new(State::default()),
            events,
        }
    }

    /// Append `block` if it extends the tip. Returns whether it was applied.
    pub fn apply_block(&self, block: Block) -> bool {
        let mut state = self.state.write();
        let expected = state.chain.last().map_or(1, |tip| tip.height + 1);
        if block.height != expected {
            debug!(block = %block.id, height = block.height, expected, "Block does not extend tip");
            return false;
        }
        info!(block = %block.id, height = block.height, "Block applied");
        state.chain.push(block);
        true
    }

    /// Current tip, if any block was applied.
    pub fn tip(&self) -> Option<Block> {
        self.state.read().chain.last().cloned()
    }

    fn common_block(block: &Block) -> CommonBlock {
        CommonBlock {
            height: block.height,
            id: block.id.clone(),
            previous_block: block
                .body
                .get("previousBlock")
                .and_then(Value::as_str)
                .map(str::to_string),
            timestamp: block
                .body
                .get("timestamp")
                .and_then(Value::as_u64)
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl BlockStore for InMemoryLedger {
    async fn query_common_block(
        &self,
        ids: &[String],
        min: i64,
        max: i64,
    ) -> Result<Option<CommonBlock>, StoreError> {
        if min > max {
            return Err(StoreError(format!("empty height range {}..{}", min, max)));
        }
        let state = self.state.read();
        Ok(state
            .chain
            .iter()
            .rev()
            .filter(|block| (min..=max).contains(&i64::try_from(block.height).unwrap_or(i64::MAX)))
            .find(|block| ids.contains(&block.id))
            .map(Self::common_block))
    }

    async fn load_blocks(
        &self,
        last_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Value>, StoreError> {
        let state = self.state.read();
        let start = match last_id {
            None => 0,
            Some(id) => match state.chain.iter().position(|block| block.id == id) {
                Some(index) => index + 1,
                None => return Ok(Vec::new()),
            },
        };
        state
            .chain
            .iter()
            .skip(start)
            .take(limit)
            .map(|block| serde_json::to_value(block).map_err(|e| StoreError(e.to_string())))
            .collect()
    }

    async fn last_height(&self) -> u64 {
        self.state.read().chain.last().map_or(0, |tip| tip.height)
    }
}

#[async_trait]
impl TransactionPool for InMemoryLedger {
    async fn unconfirmed(&self) -> Vec<Transaction> {
        self.state.read().unconfirmed.clone()
    }

    async fn has_unconfirmed(&self, transaction: &Transaction) -> bool {
        self.state
            .read()
            .unconfirmed
            .iter()
            .any(|pending| pending.id == transaction.id)
    }

    async fn receive_transactions(&self, transactions: Vec<Transaction>) -> Result<(), PoolError> {
        let mut admitted = Vec::new();
        {
            let mut state = self.state.write();
            for transaction in transactions {
                if transaction.id.is_empty() {
                    return Err(PoolError("Transaction id is missing".to_string()));
                }
                if state.unconfirmed.iter().any(|pending| pending.id == transaction.id) {
                    continue;
                }
                state.unconfirmed.push(transaction.clone());
                admitted.push(transaction);
            }
        }

        for transaction in admitted {
            self.events
                .publish(TransportEvent::UnconfirmedTransaction {
                    transaction,
                    broadcast: true,
                })
                .await;
        }
        Ok(())
    }
}

#[async_trait]
impl MultisigProcessor for InMemoryLedger {
    async fn process_signature(&self, share: SignatureShare) -> Result<(), DispatchError> {
        {
            let mut state = self.state.write();
            let transaction = state
                .unconfirmed
                .iter_mut()
                .find(|pending| pending.id == share.transaction)
                .ok_or_else(|| DispatchError(format!("Transaction not found: {}", share.transaction)))?;
            if transaction.signatures.contains(&share.signature) {
                return Err(DispatchError("Signature already exists".to_string()));
            }
            transaction.signatures.push(share.signature.clone());
        }

        self.events
            .publish(TransportEvent::SignatureCreated {
                signature: share,
                broadcast: true,
            })
            .await;
        Ok(())
    }
}
