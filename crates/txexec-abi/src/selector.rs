use txexec_primitives::keccak256;

/// Computes a method selector the way every precompiled dispatches on one:
/// the first 4 bytes (big-endian) of `keccak256(signature)`, where
/// `signature` is the canonical `name(type1,type2,...)` string.
pub fn selector_of(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[0..4]);
    out
}

/// Splits call input into its leading 4-byte selector and the remaining
/// word-encoded arguments. Returns `None` if `input` is shorter than a
/// selector, which callers treat as a malformed call.
pub fn split_selector(input: &[u8]) -> Option<([u8; 4], &[u8])> {
    if input.len() < 4 {
        return None;
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&input[0..4]);
    Some((selector, &input[4..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_matches_known_signature() {
        // keccak256("transfer(address,uint256)")[0..4] == 0xa9059cbb, the
        // textbook ERC-20 selector; a good cross-check that our keccak path
        // agrees with every other Ethereum-tooling implementation.
        let sel = selector_of("transfer(address,uint256)");
        assert_eq!(hex::encode(sel), "a9059cbb");
    }

    #[test]
    fn split_selector_rejects_short_input() {
        assert!(split_selector(&[1, 2, 3]).is_none());
    }

    #[test]
    fn split_selector_separates_head_and_tail() {
        let input = [0xaa, 0xbb, 0xcc, 0xdd, 0x01, 0x02];
        let (sel, rest) = split_selector(&input).unwrap();
        assert_eq!(sel, [0xaa, 0xbb, 0xcc, 0xdd]);
        assert_eq!(rest, &[0x01, 0x02]);
    }
}
