use crate::{keccak256, Address, B256};
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Takes the rightmost 20 bytes of a 32-byte hash. Used to turn a hash output
/// into an address for both CREATE and CREATE2.
#[inline]
pub fn right160(hash: B256) -> Address {
    Address::from_slice(&hash.as_slice()[12..])
}

/// `CREATE` contract address: `right160(hash(sender || nonce))`.
///
/// `nonce` is encoded as its decimal string representation, matching the
/// original executor's `sender + nonce.str()` concatenation rather than
/// Ethereum mainnet's RLP encoding — this executor is not wire-compatible
/// with mainnet CREATE addressing (see DESIGN.md).
pub fn create1_address(sender: Address, nonce: u64) -> Address {
    let mut buf = Vec::with_capacity(20 + 20);
    buf.extend_from_slice(sender.as_slice());
    buf.extend_from_slice(nonce.to_string().as_bytes());
    right160(keccak256(&buf))
}

/// `CREATE2` contract address: `right160(hash(0xff || sender || salt || hash(init)))`.
pub fn create2_address(sender: Address, salt: B256, init_code: &[u8]) -> Address {
    let init_hash = keccak256(init_code);
    let mut buf = Vec::with_capacity(1 + 20 + 32 + 32);
    buf.push(0xff);
    buf.extend_from_slice(sender.as_slice());
    buf.extend_from_slice(salt.as_slice());
    buf.extend_from_slice(init_hash.as_slice());
    right160(keccak256(&buf))
}
