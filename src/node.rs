//! Shared, single-writer access to a chain index.

use crate::blockchain::{Block, ChainIndex, Sha256Hash};
use crate::crypto::{Secp256k1Verifier, SignatureVerifier};
use crate::error::BlockRejection;
use crate::transaction::Transaction;
use parking_lot::Mutex;
use std::sync::Arc;

/// Clonable handle that serializes every operation on one [`ChainIndex`].
///
/// The index's check-then-insert sequence in `add_block` is not atomic on its
/// own; hosts that receive blocks from several sources go through this.
pub struct SharedChain<V = Secp256k1Verifier> {
    inner: Arc<Mutex<ChainIndex<V>>>,
}

impl<V> Clone for SharedChain<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: SignatureVerifier> SharedChain<V> {
    pub fn new(chain: ChainIndex<V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(chain)),
        }
    }

    pub fn submit_block(&self, block: Block) -> Result<Sha256Hash, BlockRejection> {
        self.inner.lock().try_add_block(block)
    }

    pub fn submit_transaction(&self, tx: Transaction) -> bool {
        self.inner.lock().add_transaction(tx)
    }

    pub fn best_height(&self) -> u64 {
        self.inner.lock().best_height()
    }

    pub fn best_block_id(&self) -> Sha256Hash {
        self.inner.lock().best_block_id()
    }

    /// Runs `f` while holding the lock.
    pub fn with_chain<R>(&self, f: impl FnOnce(&ChainIndex<V>) -> R) -> R {
        f(&self.inner.lock())
    }

    pub fn with_chain_mut<R>(&self, f: impl FnOnce(&mut ChainIndex<V>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use std::thread;

    #[test]
    fn test_concurrent_submitters_agree_on_one_best() {
        let miner = KeyPair::generate().unwrap();
        let genesis = Block::genesis(Transaction::coinbase(10, miner.owner_key(), 0));
        let genesis_id = genesis.hash();
        let shared = SharedChain::new(ChainIndex::new(genesis, 10));

        let handles: Vec<_> = (1..=8u64)
            .map(|nonce| {
                let shared = shared.clone();
                let owner = miner.owner_key();
                thread::spawn(move || {
                    let block = Block::new(genesis_id, vec![], Transaction::coinbase(1, owner, nonce));
                    shared.submit_block(block).is_ok()
                })
            })
            .collect();

        let accepted = handles.into_iter().map(|h| h.join()).filter(|r| matches!(r, Ok(true))).count();
        assert_eq!(accepted, 8);
        assert_eq!(shared.best_height(), 2);
        assert_eq!(shared.with_chain(|c| c.node_count()), 9);
    }

    #[test]
    fn test_transactions_reach_pool() {
        let miner = KeyPair::generate().unwrap();
        let genesis = Block::genesis(Transaction::coinbase(10, miner.owner_key(), 0));
        let shared = SharedChain::new(ChainIndex::new(genesis, 10));

        assert!(shared.submit_transaction(Transaction::new(1)));
        assert!(!shared.submit_transaction(Transaction::new(1)));
        let block = shared.with_chain(|c| c.assemble_block(miner.owner_key(), 5, 1));
        assert_eq!(block.transactions.len(), 1);

        shared.submit_block(block).unwrap();
        assert!(shared.with_chain(|c| c.get_pending_pool().is_empty()));
        shared.with_chain_mut(|c| c.get_pending_pool_mut().add_transaction(Transaction::new(2)));
        assert_eq!(shared.with_chain(|c| c.get_pending_pool().len()), 1);
    }
}
