//! Pending transactions not yet included in a block

use crate::blockchain::Sha256Hash;
use crate::gossip::Gossip;
use crate::transaction::Transaction;
use std::collections::{HashMap, HashSet};

/// Set of pending transactions keyed by identity.
///
/// Remembers first-seen order so block assembly is deterministic. No
/// validation happens here; transactions are checked when a block is built.
#[derive(Debug, Clone, Default)]
pub struct Mempool {
    entries: HashMap<Sha256Hash, (u64, Transaction)>,
    next_seq: u64,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the transaction was already pending; its original
    /// position is kept.
    pub fn add_transaction(&mut self, tx: Transaction) -> bool {
        let txid = tx.hash();
        if self.entries.contains_key(&txid) {
            return false;
        }
        self.entries.insert(txid, (self.next_seq, tx));
        self.next_seq += 1;
        true
    }

    /// Removing an untracked transaction is a no-op.
    pub fn remove_transaction(&mut self, txid: &Sha256Hash) -> Option<Transaction> {
        self.entries.remove(txid).map(|(_, tx)| tx)
    }

    pub fn contains(&self, txid: &Sha256Hash) -> bool {
        self.entries.contains_key(txid)
    }

    pub fn get(&self, txid: &Sha256Hash) -> Option<&Transaction> {
        self.entries.get(txid).map(|(_, tx)| tx)
    }

    /// Pending transactions in first-seen order.
    pub fn transactions(&self) -> Vec<&Transaction> {
        let mut ordered: Vec<_> = self.entries.values().collect();
        ordered.sort_by_key(|(seq, _)| *seq);
        ordered.into_iter().map(|(_, tx)| tx).collect()
    }

    pub fn to_set(&self) -> HashSet<Transaction> {
        self.entries.values().map(|(_, tx)| tx.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds everything `relay` would broadcast. Returns how many were new.
    pub fn seed_from<G: Gossip + ?Sized>(&mut self, relay: &G) -> usize {
        let mut incoming: Vec<_> = relay.drain_for_broadcast().into_iter().collect();
        // Sets carry no order; fall back to identity order.
        incoming.sort_by_cached_key(|tx| tx.hash());
        incoming
            .into_iter()
            .filter(|tx| self.add_transaction(tx.clone()))
            .count()
    }

    pub fn publish_to<G: Gossip + ?Sized>(&self, relay: &mut G) {
        relay.set_initial_pending(self.to_set());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gossip::PeerId;

    /// Relay that forwards everything it ever heard from a followee.
    #[derive(Default)]
    struct FloodRelay {
        followees: Vec<bool>,
        pending: HashSet<Transaction>,
    }

    impl Gossip for FloodRelay {
        fn set_peers(&mut self, followees: &[bool]) {
            self.followees = followees.to_vec();
        }

        fn set_initial_pending(&mut self, pending: HashSet<Transaction>) {
            self.pending = pending;
        }

        fn drain_for_broadcast(&self) -> HashSet<Transaction> {
            self.pending.clone()
        }

        fn merge_received(&mut self, received: Vec<(Transaction, PeerId)>) {
            for (tx, sender) in received {
                if self.followees.get(sender).copied().unwrap_or(false) {
                    self.pending.insert(tx);
                }
            }
        }
    }

    fn tx(nonce: u64) -> Transaction {
        Transaction::new(nonce)
    }

    #[test]
    fn test_add_and_remove() {
        let mut pool = Mempool::new();
        assert!(pool.add_transaction(tx(1)));
        assert!(!pool.add_transaction(tx(1)));
        assert_eq!(pool.len(), 1);

        let id = tx(1).hash();
        assert!(pool.contains(&id));
        assert_eq!(pool.remove_transaction(&id), Some(tx(1)));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut pool = Mempool::new();
        pool.add_transaction(tx(1));
        assert!(pool.remove_transaction(&tx(2).hash()).is_none());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_first_seen_order() {
        let mut pool = Mempool::new();
        for nonce in [5, 3, 9, 1] {
            pool.add_transaction(tx(nonce));
        }
        pool.add_transaction(tx(5));
        pool.remove_transaction(&tx(9).hash());

        let nonces: Vec<u64> = pool.transactions().iter().map(|t| t.nonce).collect();
        assert_eq!(nonces, vec![5, 3, 1]);
        assert_eq!(pool.to_set().len(), 3);
    }

    #[test]
    fn test_exchange_with_relay() {
        let mut relay = FloodRelay::default();
        relay.set_peers(&[false, true]);
        relay.merge_received(vec![(tx(1), 1), (tx(2), 0), (tx(3), 1)]);

        let mut pool = Mempool::new();
        pool.add_transaction(tx(3));
        assert_eq!(pool.seed_from(&relay), 1);
        assert_eq!(pool.len(), 2);
        assert!(!pool.contains(&tx(2).hash()));

        let mut other = FloodRelay::default();
        pool.publish_to(&mut other);
        assert_eq!(other.drain_for_broadcast(), pool.to_set());
    }
}
