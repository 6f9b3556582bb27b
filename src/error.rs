//! Error types for utxochain
//!
//! Validation never fails with an `Err` that callers must propagate: the core
//! answers with `bool`/`Option`, and the rejection enums below only explain
//! *why* something was not accepted. [`ChainError`] covers the ambient
//! surfaces (configuration, crypto helpers, I/O).

use crate::blockchain::Sha256Hash;
use crate::transaction::{Amount, OutPoint};
use thiserror::Error;

/// Why a single transaction was not accepted against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxRejection {
    #[error("input {index} references missing output {outpoint}")]
    MissingOutput { index: usize, outpoint: OutPoint },
    #[error("input {index} carries an invalid signature")]
    BadSignature { index: usize },
    #[error("input {index} claims {outpoint} a second time")]
    DuplicateClaim { index: usize, outpoint: OutPoint },
    #[error("output {index} has negative value {value}")]
    NegativeOutput { index: usize, value: Amount },
    #[error("inputs total {inputs} is less than outputs total {outputs}")]
    InsufficientInputs { inputs: i128, outputs: i128 },
}

/// Why a block was not attached to the chain index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockRejection {
    #[error("genesis-shaped block cannot be added to a non-empty chain")]
    GenesisNotAllowed,
    #[error("block {} is already known", hex::encode(.0))]
    AlreadyKnown(Sha256Hash),
    #[error("parent {} is not a retained branch node", hex::encode(.0))]
    UnknownParent(Sha256Hash),
    #[error("block height {candidate_height} is too old for best height {best_height} (cutoff age {cutoff_age})")]
    TooOld {
        candidate_height: u64,
        best_height: u64,
        cutoff_age: u64,
    },
    #[error("transaction {index} rejected: {reason}")]
    TransactionRejected { index: usize, reason: TxRejection },
    #[error("transaction {index} is a duplicate of an earlier one in the block")]
    DuplicateTransaction { index: usize },
    #[error("invalid coinbase: {0}")]
    InvalidCoinbase(String),
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(#[from] TxRejection),
    #[error("Invalid block: {0}")]
    InvalidBlock(#[from] BlockRejection),
    #[error("Cryptographic error: {0}")]
    CryptoError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        let outpoint = OutPoint::new([0xab; 32], 3);
        let err = TxRejection::MissingOutput { index: 1, outpoint };
        assert!(err.to_string().starts_with("input 1 references missing output abab"));
        assert!(err.to_string().ends_with(":3"));

        let err = BlockRejection::TooOld {
            candidate_height: 2,
            best_height: 12,
            cutoff_age: 10,
        };
        assert_eq!(
            err.to_string(),
            "block height 2 is too old for best height 12 (cutoff age 10)"
        );
    }

    #[test]
    fn test_chain_error_wraps_rejections() {
        let err: ChainError = BlockRejection::GenesisNotAllowed.into();
        assert_eq!(
            err.to_string(),
            "Invalid block: genesis-shaped block cannot be added to a non-empty chain"
        );
    }
}
