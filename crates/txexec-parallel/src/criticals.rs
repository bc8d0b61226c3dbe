use txexec_abi::split_selector;
use txexec_context::{BlockContext, TransactionInput};
use txexec_precompiled::PARALLEL_CONFIG_TABLE;

/// The critical field set for one transaction, as input to DAG planning:
/// `None` if it isn't registered as parallelizable (CREATE, or a call whose
/// `(contract, selector)` never went through `ParallelConfigPrecompiled`),
/// in which case [`crate::dag::ConflictDag`] treats it as conflicting with
/// every other transaction in the batch.
///
/// Only the single ABI word at the registered argument index is read, not a
/// fully Solidity-ABI-decoded value: parallel-config registration names a
/// *position*, and any static (non-dynamic) argument lives at a fixed
/// 32-byte offset regardless of its declared type.
pub fn critical_fields(ctx: &BlockContext, tx: &TransactionInput) -> Option<Vec<String>> {
    let to = tx.to?;
    let (selector, _) = split_selector(&tx.input)?;
    let function_selector = u32::from_be_bytes(selector);
    let key = format!("{to}:{function_selector:08x}");
    let row = ctx.state().get_row(PARALLEL_CONFIG_TABLE, &key).ok()??;
    let arg_index: usize = row.get("conflict_argument")?.parse().ok()?;
    let word_start = 4 + 32 * arg_index;
    let word = tx.input.get(word_start..word_start + 32)?;
    Some(vec![format!("{to}:{}", hex::encode(word))])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use txexec_context::BlockContextConfig;
    use txexec_primitives::{Address, Bytes, B256};
    use txexec_state::{InMemoryBackend, StateStorageLayer};

    fn genesis_ctx() -> BlockContext {
        let layer = StateStorageLayer::genesis(0, Arc::new(InMemoryBackend::new()));
        BlockContext::genesis(&BlockContextConfig::default(), layer, HashMap::new(), HashMap::new())
    }

    fn call(to: Address, input: Vec<u8>) -> TransactionInput {
        TransactionInput {
            tx_hash: None,
            from: Address::repeat_byte(1),
            to: Some(to),
            input: Bytes::from(input),
            gas: 1_000_000,
            origin: Address::repeat_byte(1),
            create_salt: None,
            static_call: false,
        }
    }

    #[test]
    fn unregistered_call_has_no_critical_fields() {
        let ctx = genesis_ctx();
        let tx = call(Address::repeat_byte(2), vec![1, 2, 3, 4]);
        assert!(critical_fields(&ctx, &tx).is_none());
    }

    #[test]
    fn create_never_has_critical_fields() {
        let ctx = genesis_ctx();
        let tx = TransactionInput {
            tx_hash: None,
            from: Address::repeat_byte(1),
            to: None,
            input: Bytes::from(vec![0u8; 40]),
            gas: 1_000_000,
            origin: Address::repeat_byte(1),
            create_salt: None,
            static_call: false,
        };
        assert!(critical_fields(&ctx, &tx).is_none());
    }

    #[test]
    fn registered_call_extracts_the_configured_argument_word() {
        let ctx = genesis_ctx();
        let contract = Address::repeat_byte(5);
        let selector = txexec_abi::selector_of("transfer(address,uint256)");
        let function_selector = u32::from_be_bytes(selector);

        let mut row = txexec_state::Entry::new();
        row.set("conflict_argument", "0");
        ctx.state()
            .set_row(PARALLEL_CONFIG_TABLE, &format!("{contract}:{function_selector:08x}"), row)
            .unwrap();

        let mut input = selector.to_vec();
        let mut arg_word = [0u8; 32];
        arg_word[12..32].copy_from_slice(Address::repeat_byte(9).as_slice());
        input.extend_from_slice(&arg_word);
        input.extend_from_slice(&B256::repeat_byte(7).0);

        let tx = call(contract, input);
        let fields = critical_fields(&ctx, &tx).unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields[0].contains(&hex::encode(arg_word)));
    }
}
