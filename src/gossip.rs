//! Interface to the transaction relay that feeds the pending pool.
//!
//! The relay itself lives outside this crate. It is told who it follows,
//! seeded with local pending transactions, asked what it would broadcast, and
//! handed what its followees reported. The mempool only exchanges plain
//! transaction sets with it (see [`Mempool::seed_from`] and
//! [`Mempool::publish_to`]).
//!
//! [`Mempool::seed_from`]: crate::mempool::Mempool::seed_from
//! [`Mempool::publish_to`]: crate::mempool::Mempool::publish_to

use crate::transaction::Transaction;
use std::collections::HashSet;

/// Index of a participant in the relay's peer graph.
pub type PeerId = usize;

pub trait Gossip {
    /// `followees[i]` is true when this participant listens to peer `i`.
    fn set_peers(&mut self, followees: &[bool]);

    fn set_initial_pending(&mut self, pending: HashSet<Transaction>);

    /// Transactions this participant currently knows and would relay.
    fn drain_for_broadcast(&self) -> HashSet<Transaction>;

    /// Folds transactions reported by followees into local pending state.
    fn merge_received(&mut self, received: Vec<(Transaction, PeerId)>);
}
