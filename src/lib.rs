//! utxochain - an in-memory UTXO ledger with a fork-aware chain index
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Ledger
//! - [`transaction`] - Transaction types, single-transaction and batch validation
//! - [`blockchain`] - Blocks, unspent-output snapshots, block validation and the chain index
//! - [`mempool`] - Pending transactions awaiting a block
//!
//! ## Collaborators
//! - [`crypto`] - Hashing, signatures and the verifier seam (secp256k1)
//! - [`gossip`] - Interface to the transaction relay feeding the mempool
//! - [`node`] - Single-writer shared access for concurrent hosts
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error and rejection types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Collaborators
// ============================================================================
pub mod crypto;
pub mod gossip;
pub mod node;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
