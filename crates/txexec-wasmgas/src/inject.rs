use wasm_instrument::gas_metering;
use wasm_instrument::parity_wasm::deserialize_buffer;

use crate::cost_table::InstructionCostTable;
use crate::validate::{scan_for_forbidden_instructions, ForbiddenInstruction};

/// A module can fail to parse, contain an opcode this engine forbids, or
/// succeed and come back with gas charges injected.
#[derive(Debug, thiserror::Error)]
pub enum GasInjectionError {
    #[error("malformed wasm module: {0}")]
    InvalidFormat(String),
    #[error(transparent)]
    ForbiddenOpcode(#[from] ForbiddenInstruction),
    #[error("gas metering injection failed")]
    InjectionFailed,
}

/// Parses `wasm`, rejects it if it uses a forbidden instruction, then
/// returns a rewritten module that charges gas for every executed
/// instruction and for memory growth.
pub fn inject_gas_metering(wasm: &[u8]) -> Result<Vec<u8>, GasInjectionError> {
    let module = deserialize_buffer(wasm).map_err(|err| GasInjectionError::InvalidFormat(err.to_string()))?;
    if let Err(err) = scan_for_forbidden_instructions(&module) {
        tracing::debug!(%err, "rejecting wasm module during gas metering injection");
        return Err(err.into());
    }

    let table = InstructionCostTable::default();
    let metered = gas_metering::inject(wasm, &table, "env").map_err(|_| GasInjectionError::InjectionFailed)?;
    tracing::trace!(original_len = wasm.len(), metered_len = metered.len(), "injected gas metering");
    Ok(metered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wat_to_wasm(wat: &str) -> Vec<u8> {
        wat::parse_str(wat).expect("valid wat fixture")
    }

    #[test]
    fn a_well_formed_integer_module_is_metered_successfully() {
        let wasm = wat_to_wasm(
            "(module (func (export \"f\") (param i32) (result i32) local.get 0 i32.const 1 i32.add))",
        );
        let metered = inject_gas_metering(&wasm).expect("metering should succeed");
        assert!(metered.len() > wasm.len());
    }

    #[test]
    fn a_module_with_floating_point_is_rejected() {
        let wasm = wat_to_wasm(
            "(module (func (export \"f\") (param f64 f64) (result f64) local.get 0 local.get 1 f64.add))",
        );
        let err = inject_gas_metering(&wasm).unwrap_err();
        assert!(matches!(err, GasInjectionError::ForbiddenOpcode(_)));
    }

    #[test]
    fn malformed_bytes_are_rejected() {
        let err = inject_gas_metering(&[0x00, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, GasInjectionError::InvalidFormat(_)));
    }
}
