use alloy_primitives::B256;

/// Keccak-256 of arbitrary bytes.
///
/// Re-exported as a free function (rather than re-exporting `alloy_primitives`
/// directly everywhere) so callers have one place to swap the backing
/// implementation, matching how the rest of the workspace treats hashers as
/// a pluggable external capability.
#[inline]
pub fn keccak256(input: impl AsRef<[u8]>) -> B256 {
    alloy_primitives::keccak256(input)
}
