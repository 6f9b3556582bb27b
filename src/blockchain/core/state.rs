use crate::crypto::OwnerKey;
use crate::transaction::{OutPoint, Transaction, TxOutput};
use std::collections::HashMap;

/// Unspent-output set as of one point in a branch's history.
///
/// Pure storage: it never validates what it is given. Each out-point maps to
/// at most one output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoSnapshot {
    utxos: HashMap<OutPoint, TxOutput>,
}

impl UtxoSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot holding exactly the outputs of `coinbase`.
    pub fn from_coinbase(coinbase: &Transaction) -> Self {
        let mut snapshot = Self::new();
        snapshot.credit_outputs(coinbase);
        snapshot
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.utxos.contains_key(outpoint)
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&TxOutput> {
        self.utxos.get(outpoint)
    }

    /// Inserts `output`, returning whatever was stored under `outpoint` before.
    pub fn insert(&mut self, outpoint: OutPoint, output: TxOutput) -> Option<TxOutput> {
        self.utxos.insert(outpoint, output)
    }

    pub fn remove(&mut self, outpoint: &OutPoint) -> Option<TxOutput> {
        self.utxos.remove(outpoint)
    }

    /// Adds every output of `tx` under `(tx.hash(), index)`.
    pub fn credit_outputs(&mut self, tx: &Transaction) {
        let txid = tx.hash();
        for (index, output) in tx.outputs.iter().enumerate() {
            self.utxos
                .insert(OutPoint::new(txid, index as u32), output.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &TxOutput)> {
        self.utxos.iter()
    }

    pub fn total_value(&self) -> i128 {
        self.utxos.values().map(|o| o.value as i128).sum()
    }

    pub fn balance_of(&self, owner: &OwnerKey) -> i128 {
        self.utxos
            .values()
            .filter(|o| &o.owner == owner)
            .map(|o| o.value as i128)
            .sum()
    }

    /// Outputs paying `owner`, ordered by out-point so callers get a stable view.
    pub fn owned_by(&self, owner: &OwnerKey) -> Vec<(OutPoint, TxOutput)> {
        let mut owned: Vec<_> = self
            .utxos
            .iter()
            .filter(|(_, o)| &o.owner == owner)
            .map(|(p, o)| (*p, o.clone()))
            .collect();
        owned.sort_by(|a, b| a.0.cmp(&b.0));
        owned
    }
}
