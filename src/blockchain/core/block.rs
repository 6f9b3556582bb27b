use crate::transaction::Transaction;
use sha2::{Digest, Sha256};

pub type Sha256Hash = [u8; 32];

/// A batch of transactions on top of a parent block, plus the coinbase that
/// rewards whoever produced it. Only the genesis block has no parent.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub prev: Option<Sha256Hash>,
    pub transactions: Vec<Transaction>,
    pub coinbase: Transaction,
}

impl Block {
    pub fn new(prev: Sha256Hash, transactions: Vec<Transaction>, coinbase: Transaction) -> Self {
        Block {
            prev: Some(prev),
            transactions,
            coinbase,
        }
    }

    pub fn genesis(coinbase: Transaction) -> Self {
        Block {
            prev: None,
            transactions: Vec::new(),
            coinbase,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.prev.is_none()
    }

    pub fn hash(&self) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update("BLOCK".as_bytes());
        match self.prev {
            Some(prev) => {
                hasher.update([1u8]);
                hasher.update(prev);
            }
            None => hasher.update([0u8]),
        }
        hasher.update((self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            hasher.update(tx.hash());
        }
        hasher.update(self.coinbase.hash());
        hasher.finalize().into()
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::OwnerKey;

    fn coinbase(nonce: u64) -> Transaction {
        Transaction::coinbase(25, OwnerKey::from_bytes(vec![2; 33]), nonce)
    }

    #[test]
    fn test_genesis_shape() {
        let genesis = Block::genesis(coinbase(0));
        assert!(genesis.is_genesis());
        assert!(!Block::new(genesis.hash(), vec![], coinbase(1)).is_genesis());
    }

    #[test]
    fn test_hash_depends_on_parent_and_contents() {
        let genesis = Block::genesis(coinbase(0));
        let a = Block::new(genesis.hash(), vec![], coinbase(1));
        let b = Block::new(genesis.hash(), vec![], coinbase(2));
        let c = Block::new(a.hash(), vec![], coinbase(1));

        assert_eq!(a.hash(), a.clone().hash());
        assert_ne!(a.hash(), b.hash());
        assert_ne!(a.hash(), c.hash());
        assert_ne!(genesis.hash(), Block { prev: Some([0; 32]), ..genesis.clone() }.hash());
    }
}
