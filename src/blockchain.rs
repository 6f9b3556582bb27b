// Thin re-export module: the implementation lives under `blockchain/core` and
// is split by responsibility (blocks, snapshots, block validation, chain index).

pub mod core;
pub use core::*;
