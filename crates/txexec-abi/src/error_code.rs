use alloy_primitives::I256;

/// Encodes a precompiled result/error code as a single ABI `int256` word,
/// the format every precompiled method returns its status in (§4.5: "result
/// codes are returned ABI-encoded as a single `int256`, 0 meaning success").
pub fn encode_error_code(code: i64) -> [u8; 32] {
    I256::try_from(code)
        .expect("i64 always fits in int256")
        .to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_encodes_to_all_zero_word() {
        assert_eq!(encode_error_code(0), [0u8; 32]);
    }

    #[test]
    fn negative_code_is_twos_complement() {
        let encoded = encode_error_code(-1);
        assert_eq!(encoded, [0xffu8; 32]);
    }

    #[test]
    fn positive_code_round_trips() {
        let encoded = encode_error_code(17);
        let back = I256::from_be_bytes(encoded);
        assert_eq!(back, I256::try_from(17).unwrap());
    }
}
