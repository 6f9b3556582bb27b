/// Validation of transactions against an unspent-output snapshot
use crate::blockchain::{Sha256Hash, UtxoSnapshot};
use crate::crypto::{Secp256k1Verifier, SignatureVerifier};
use crate::error::TxRejection;
use crate::transaction::types::Transaction;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Why a candidate was left out of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Invalid(TxRejection),
    /// Same transaction value already accepted earlier in the batch.
    Duplicate,
}

/// Result of running a batch of candidates over a snapshot.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Accepted transactions, in the order they were supplied.
    pub accepted: Vec<Transaction>,
    /// Positions in the candidate list that were skipped, and why.
    pub skipped: Vec<(usize, SkipReason)>,
    /// The input snapshot with every accepted transaction applied.
    pub snapshot: UtxoSnapshot,
}

/// Checks transactions against a snapshot and applies batches of them.
#[derive(Debug, Clone, Default)]
pub struct TxValidator<V = Secp256k1Verifier> {
    verifier: V,
}

impl TxValidator<Secp256k1Verifier> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V: SignatureVerifier> TxValidator<V> {
    pub fn with_verifier(verifier: V) -> Self {
        TxValidator { verifier }
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Checks `tx` against `snapshot`, naming the first rule it breaks.
    ///
    /// Per input: the referenced output exists, the signature verifies
    /// against its owner, and no earlier input claimed it. Then every output
    /// is non-negative and inputs cover outputs.
    pub fn check_tx(&self, tx: &Transaction, snapshot: &UtxoSnapshot) -> Result<(), TxRejection> {
        let mut claimed = HashSet::with_capacity(tx.inputs.len());
        let mut input_total: i128 = 0;

        for (index, input) in tx.inputs.iter().enumerate() {
            let spent = snapshot
                .get(&input.prev)
                .ok_or(TxRejection::MissingOutput {
                    index,
                    outpoint: input.prev,
                })?;

            let verified = tx
                .signable_message(index)
                .is_some_and(|message| self.verifier.verify(&spent.owner, &message, &input.signature));
            if !verified {
                return Err(TxRejection::BadSignature { index });
            }

            if !claimed.insert(input.prev) {
                return Err(TxRejection::DuplicateClaim {
                    index,
                    outpoint: input.prev,
                });
            }
            input_total += spent.value as i128;
        }

        let mut output_total: i128 = 0;
        for (index, output) in tx.outputs.iter().enumerate() {
            if output.value < 0 {
                return Err(TxRejection::NegativeOutput {
                    index,
                    value: output.value,
                });
            }
            output_total += output.value as i128;
        }

        if input_total < output_total {
            return Err(TxRejection::InsufficientInputs {
                inputs: input_total,
                outputs: output_total,
            });
        }
        Ok(())
    }

    pub fn is_valid_tx(&self, tx: &Transaction, snapshot: &UtxoSnapshot) -> bool {
        self.check_tx(tx, snapshot).is_ok()
    }

    /// Greedy, first-seen-wins batch application.
    ///
    /// Candidates are taken in the order given; each is checked against the
    /// snapshot as already updated by the candidates accepted before it. When
    /// two candidates spend the same output the earlier one wins.
    pub fn handle_txs(
        &self,
        candidates: &[Transaction],
        snapshot: UtxoSnapshot,
    ) -> (Vec<Transaction>, UtxoSnapshot) {
        let outcome = self.process_batch(candidates, snapshot);
        (outcome.accepted, outcome.snapshot)
    }

    /// Like [`handle_txs`](Self::handle_txs), also reporting skipped candidates.
    pub fn process_batch(&self, candidates: &[Transaction], mut snapshot: UtxoSnapshot) -> BatchOutcome {
        let mut accepted = Vec::new();
        let mut accepted_ids: HashSet<Sha256Hash> = HashSet::new();
        let mut skipped = Vec::new();

        for (position, tx) in candidates.iter().enumerate() {
            let txid = tx.hash();
            if accepted_ids.contains(&txid) {
                trace!(txid = %hex::encode(txid), "duplicate candidate skipped");
                skipped.push((position, SkipReason::Duplicate));
                continue;
            }

            if let Err(reason) = self.check_tx(tx, &snapshot) {
                debug!(txid = %hex::encode(txid), %reason, "candidate rejected");
                skipped.push((position, SkipReason::Invalid(reason)));
                continue;
            }

            for input in &tx.inputs {
                snapshot.remove(&input.prev);
            }
            snapshot.credit_outputs(tx);
            accepted_ids.insert(txid);
            accepted.push(tx.clone());
        }

        BatchOutcome {
            accepted,
            skipped,
            snapshot,
        }
    }
}
