use super::block::Block;
use super::state::UtxoSnapshot;
use crate::crypto::{Secp256k1Verifier, SignatureVerifier};
use crate::error::BlockRejection;
use crate::transaction::{SkipReason, TxValidator};

/// Applies whole blocks to a parent snapshot, all or nothing.
#[derive(Debug, Clone, Default)]
pub struct BlockValidator<V = Secp256k1Verifier> {
    txs: TxValidator<V>,
}

impl BlockValidator<Secp256k1Verifier> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V: SignatureVerifier> BlockValidator<V> {
    pub fn with_verifier(verifier: V) -> Self {
        BlockValidator {
            txs: TxValidator::with_verifier(verifier),
        }
    }

    pub fn tx_validator(&self) -> &TxValidator<V> {
        &self.txs
    }

    /// Returns the snapshot after `block`, or why it cannot follow `parent`.
    ///
    /// Every non-coinbase transaction must be accepted in listed order, each
    /// one seeing the outputs of those before it. The coinbase outputs are
    /// credited last. `parent` is never modified.
    pub fn try_apply_block(
        &self,
        block: &Block,
        parent: &UtxoSnapshot,
    ) -> Result<UtxoSnapshot, BlockRejection> {
        let coinbase = &block.coinbase;
        if !coinbase.is_coinbase() {
            return Err(BlockRejection::InvalidCoinbase(format!(
                "coinbase has {} inputs",
                coinbase.inputs.len()
            )));
        }
        if let Some(output) = coinbase.outputs.iter().find(|o| o.value < 0) {
            return Err(BlockRejection::InvalidCoinbase(format!(
                "negative reward output {}",
                output.value
            )));
        }

        let outcome = self.txs.process_batch(&block.transactions, parent.clone());
        if let Some((index, reason)) = outcome.skipped.into_iter().next() {
            return Err(match reason {
                SkipReason::Invalid(reason) => BlockRejection::TransactionRejected { index, reason },
                SkipReason::Duplicate => BlockRejection::DuplicateTransaction { index },
            });
        }

        let mut snapshot = outcome.snapshot;
        let coinbase_id = coinbase.hash();
        for index in 0..coinbase.outputs.len() {
            let outpoint = coinbase.outpoint(index as u32);
            if snapshot.contains(&outpoint) {
                return Err(BlockRejection::InvalidCoinbase(format!(
                    "output {} of coinbase {} already exists",
                    index,
                    hex::encode(coinbase_id)
                )));
            }
        }
        snapshot.credit_outputs(coinbase);
        Ok(snapshot)
    }

    pub fn apply_block(&self, block: &Block, parent: &UtxoSnapshot) -> Option<UtxoSnapshot> {
        self.try_apply_block(block, parent).ok()
    }
}
