use txexec_abi::{selector_of, split_selector};
use txexec_context::{BlockContext, Precompiled, PrecompiledError};
use txexec_primitives::Address;

use crate::words::{WordReader, WordWriter};

const HASH_COST: i64 = 200;
const RECOVER_COST: i64 = 3_000;

/// `0x100a`: exposes the national-standard primitives the VM has no opcode
/// for (`sm3`, `keccak256Hash`, `sm2Verify`).
pub struct CryptoPrecompiled;

impl Precompiled for CryptoPrecompiled {
    fn call(
        &self,
        _ctx: &BlockContext,
        input: &[u8],
        _origin: Address,
        _sender: Address,
    ) -> Result<(i64, Vec<u8>), PrecompiledError> {
        let (selector, body) =
            split_selector(input).ok_or_else(|| PrecompiledError::new("call data too short for a selector"))?;
        let mut reader = WordReader::new(body);

        if selector == selector_of("sm3(bytes)") {
            let data = reader.read_dynamic().ok_or_else(|| PrecompiledError::new("malformed data"))?;
            let mut writer = WordWriter::new();
            writer.push_bytes32(txexec_crypto::sm3(&data));
            return Ok((HASH_COST, writer.into_bytes()));
        }

        if selector == selector_of("keccak256Hash(bytes)") {
            let data = reader.read_dynamic().ok_or_else(|| PrecompiledError::new("malformed data"))?;
            let mut writer = WordWriter::new();
            writer.push_bytes32(txexec_crypto::keccak256(&data));
            return Ok((HASH_COST, writer.into_bytes()));
        }

        if selector == selector_of("sm2Verify(bytes32,bytes,address)") {
            let hash = reader.read_bytes32().ok_or_else(|| PrecompiledError::new("malformed hash"))?;
            let signature = reader.read_dynamic().ok_or_else(|| PrecompiledError::new("malformed signature"))?;
            let claimed = reader.read_address().ok_or_else(|| PrecompiledError::new("malformed address"))?;
            let mut writer = WordWriter::new();
            match txexec_crypto::sm2_recover(&hash, &signature) {
                Ok((_pubkey, recovered)) => writer.push_bool(recovered == claimed),
                Err(_) => writer.push_bool(false),
            };
            return Ok((RECOVER_COST, writer.into_bytes()));
        }

        Err(PrecompiledError::new("unknown Crypto selector"))
    }
}
