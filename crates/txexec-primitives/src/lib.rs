//! Shared value types for the transaction execution core.
//!
//! This crate has no opinions about EVM vs. WASM semantics; it only carries
//! the byte/address/hash vocabulary every other crate in the workspace needs.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod address;
mod hash;

pub use address::{create1_address, create2_address, right160};
pub use hash::keccak256;

pub use alloy_primitives::{Address, Bytes, B256, U256};

/// A block number. Transaction Execution Core never interprets this beyond
/// ordering and equality: consensus assigns meaning to it.
pub type BlockNumber = u64;

/// A gas amount. Signed so that intermediate accounting (e.g. refunds before
/// the floor is applied) can be represented without saturating arithmetic.
pub type Gas = i64;
