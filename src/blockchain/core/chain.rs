use super::block::{Block, Sha256Hash};
use super::state::UtxoSnapshot;
use super::validation::BlockValidator;
use crate::crypto::{OwnerKey, Secp256k1Verifier, SignatureVerifier};
use crate::error::BlockRejection;
use crate::mempool::Mempool;
use crate::transaction::{Amount, Transaction};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info, trace};

/// How far behind the best height a new block may still attach.
pub const DEFAULT_CUTOFF_AGE: u64 = 10;

/// One retained block with its height and the ledger as of that block.
#[derive(Debug, Clone)]
pub struct BranchNode {
    pub block: Block,
    pub height: u64,
    pub created_at: DateTime<Utc>,
    pub snapshot: UtxoSnapshot,
    /// Nearest ancestor still held by the index, if any.
    pub parent: Option<Sha256Hash>,
}

/// Tree of competing branches rooted at genesis.
///
/// Nodes live in an arena keyed by block identity and point back at their
/// parent's key. The best node is the first one seen at the greatest height.
/// Once the best height moves, history more than `cutoff_age` blocks behind
/// it is dropped unless it is where two live branches meet.
///
/// Not internally synchronized; see [`SharedChain`](crate::node::SharedChain).
pub struct ChainIndex<V = Secp256k1Verifier> {
    nodes: HashMap<Sha256Hash, BranchNode>,
    best: Sha256Hash,
    cutoff_age: u64,
    mempool: Mempool,
    validator: BlockValidator<V>,
}

impl ChainIndex<Secp256k1Verifier> {
    /// Starts a chain at `genesis`, which is trusted. Only its coinbase seeds
    /// the initial snapshot.
    pub fn new(genesis: Block, cutoff_age: u64) -> Self {
        Self::with_verifier(genesis, cutoff_age, Secp256k1Verifier)
    }
}

impl<V: SignatureVerifier> ChainIndex<V> {
    /// A `cutoff_age` of zero is raised to one so the best node is never
    /// outside its own window.
    pub fn with_verifier(genesis: Block, cutoff_age: u64, verifier: V) -> Self {
        let id = genesis.hash();
        let snapshot = UtxoSnapshot::from_coinbase(&genesis.coinbase);
        let node = BranchNode {
            block: genesis,
            height: 1,
            created_at: Utc::now(),
            snapshot,
            parent: None,
        };

        let mut nodes = HashMap::new();
        nodes.insert(id, node);
        ChainIndex {
            nodes,
            best: id,
            cutoff_age: cutoff_age.max(1),
            mempool: Mempool::new(),
            validator: BlockValidator::with_verifier(verifier),
        }
    }

    pub fn add_block(&mut self, block: Block) -> bool {
        self.try_add_block(block).is_ok()
    }

    /// Attaches `block` to its parent's branch and returns its identity.
    ///
    /// On any rejection the index, best pointer and mempool are unchanged.
    pub fn try_add_block(&mut self, block: Block) -> Result<Sha256Hash, BlockRejection> {
        let id = block.hash();
        let result = self.attach(id, block);
        if let Err(reason) = &result {
            debug!(block = %hex::encode(id), %reason, "block rejected");
        }
        result
    }

    fn attach(&mut self, id: Sha256Hash, block: Block) -> Result<Sha256Hash, BlockRejection> {
        let prev = block.prev.ok_or(BlockRejection::GenesisNotAllowed)?;
        if self.nodes.contains_key(&id) {
            return Err(BlockRejection::AlreadyKnown(id));
        }
        let parent = self
            .nodes
            .get(&prev)
            .ok_or(BlockRejection::UnknownParent(prev))?;

        let height = parent.height + 1;
        let best_height = self.best_height();
        if height + self.cutoff_age <= best_height {
            return Err(BlockRejection::TooOld {
                candidate_height: height,
                best_height,
                cutoff_age: self.cutoff_age,
            });
        }

        let snapshot = self.validator.try_apply_block(&block, &parent.snapshot)?;

        for tx in &block.transactions {
            self.mempool.remove_transaction(&tx.hash());
        }
        self.nodes.insert(
            id,
            BranchNode {
                block,
                height,
                created_at: Utc::now(),
                snapshot,
                parent: Some(prev),
            },
        );

        if height > best_height {
            info!(block = %hex::encode(id), height, "new best block");
            self.best = id;
            self.prune();
        }
        Ok(id)
    }

    /// Drops history that no acceptable block can build on any more.
    ///
    /// Visits nodes at or below `best - cutoff_age` from the highest down, so
    /// each node's children are settled before the node itself. A node with
    /// no retained child is evicted and one with several is kept as a fork
    /// point. A node with a single child is spliced out of the parent links
    /// once it is strictly below the threshold; at the threshold it is still
    /// a valid parent for a new block.
    fn prune(&mut self) {
        let threshold = self.best_height().saturating_sub(self.cutoff_age);
        if threshold == 0 {
            return;
        }

        let mut stale: Vec<(u64, Sha256Hash)> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.height <= threshold)
            .map(|(id, node)| (node.height, *id))
            .collect();
        if stale.is_empty() {
            return;
        }
        stale.sort_unstable_by(|a, b| b.cmp(a));

        let mut children: HashMap<Sha256Hash, Vec<Sha256Hash>> = HashMap::new();
        for (id, node) in &self.nodes {
            if let Some(parent) = node.parent {
                children.entry(parent).or_default().push(*id);
            }
        }

        for (height, id) in stale {
            let kids = children.remove(&id).unwrap_or_default();
            if kids.len() > 1 || (kids.len() == 1 && height == threshold) {
                children.insert(id, kids);
                continue;
            }

            let Some(node) = self.nodes.remove(&id) else {
                continue;
            };
            let grandparent = node.parent;
            let replacement = kids.first().copied();
            if let Some(child) = replacement {
                if let Some(child_node) = self.nodes.get_mut(&child) {
                    child_node.parent = grandparent;
                }
            }
            if let Some(grandparent) = grandparent {
                if let Some(siblings) = children.get_mut(&grandparent) {
                    siblings.retain(|s| s != &id);
                    siblings.extend(replacement);
                }
            }
            trace!(block = %hex::encode(id), height, spliced = replacement.is_some(), "pruned branch node");
        }
    }

    pub fn add_transaction(&mut self, tx: Transaction) -> bool {
        self.mempool.add_transaction(tx)
    }

    /// Builds a block on the best node from pending transactions.
    ///
    /// The pool is run through the batch validator in first-seen order
    /// against the best snapshot; whatever it accepts goes into the block.
    pub fn assemble_block(&self, coinbase_owner: OwnerKey, reward: Amount, nonce: u64) -> Block {
        let candidates: Vec<Transaction> = self.mempool.transactions().into_iter().cloned().collect();
        let (accepted, _) = self
            .validator
            .tx_validator()
            .handle_txs(&candidates, self.get_max_height_snapshot().clone());
        Block::new(
            self.best,
            accepted,
            Transaction::coinbase(reward, coinbase_owner, nonce),
        )
    }

    fn best_node(&self) -> &BranchNode {
        // The best node is never pruned: its height is above the threshold.
        &self.nodes[&self.best]
    }

    pub fn get_max_height_block(&self) -> &Block {
        &self.best_node().block
    }

    pub fn get_max_height_snapshot(&self) -> &UtxoSnapshot {
        &self.best_node().snapshot
    }

    pub fn get_pending_pool(&self) -> &Mempool {
        &self.mempool
    }

    pub fn get_pending_pool_mut(&mut self) -> &mut Mempool {
        &mut self.mempool
    }

    pub fn best_height(&self) -> u64 {
        self.best_node().height
    }

    pub fn best_block_id(&self) -> Sha256Hash {
        self.best
    }

    pub fn cutoff_age(&self) -> u64 {
        self.cutoff_age
    }

    pub fn contains(&self, id: &Sha256Hash) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get_node(&self, id: &Sha256Hash) -> Option<&BranchNode> {
        self.nodes.get(id)
    }

    pub fn get_block(&self, id: &Sha256Hash) -> Option<&Block> {
        self.nodes.get(id).map(|node| &node.block)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Retained nodes, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = (&Sha256Hash, &BranchNode)> {
        self.nodes.iter()
    }

    /// Retained ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: &Sha256Hash) -> Vec<Sha256Hash> {
        let mut out = Vec::new();
        let mut cursor = self.nodes.get(id).and_then(|node| node.parent);
        while let Some(parent) = cursor {
            out.push(parent);
            cursor = self.nodes.get(&parent).and_then(|node| node.parent);
        }
        out
    }
}
