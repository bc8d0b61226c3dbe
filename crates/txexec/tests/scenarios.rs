use std::sync::Arc;

use txexec::{BlockHeader, Executor};
use txexec_context::TransactionInput;
use txexec_evm::BytecodeInterpreter;
use txexec_abi::encode_error_code;
use txexec_precompiled::{addresses, WordReader, WordWriter};
use txexec_primitives::{Address, Bytes, B256, U256};

fn vm() -> Arc<BytecodeInterpreter> {
    Arc::new(BytecodeInterpreter)
}

fn started_executor() -> Executor {
    let executor = Executor::in_memory(vm());
    executor.next_block_header(BlockHeader::genesis(3_000_000_000));
    executor
}

fn tx(to: Address, input: Vec<u8>) -> TransactionInput {
    TransactionInput {
        tx_hash: None,
        from: Address::ZERO,
        to: Some(to),
        input: Bytes::from(input),
        gas: 1_000_000,
        origin: Address::ZERO,
        create_salt: None,
        static_call: false,
    }
}

fn encoded_call(signature: &str, body: Vec<u8>) -> Vec<u8> {
    let mut input = txexec_abi::selector_of(signature).to_vec();
    input.extend_from_slice(&body);
    input
}

/// Scenario 1: writing a system config key makes it readable back through
/// a throwaway `call`.
#[test]
fn system_config_write_then_read() {
    let executor = started_executor();
    let mut body = WordWriter::new();
    body.push_dynamic(b"tx_count_limit").push_dynamic(b"1000");
    let set = executor
        .execute_transaction(tx(addresses::system_config(), encoded_call("setValueByKey(string,string)", body.into_bytes())))
        .unwrap();
    assert!(set.is_success());

    let mut get_body = WordWriter::new();
    get_body.push_dynamic(b"tx_count_limit");
    let got = executor
        .call(tx(addresses::system_config(), encoded_call("getValueByKey(string)", get_body.into_bytes())))
        .unwrap();
    assert!(got.is_success());
    assert_eq!(WordReader::new(&got.output).read_string().as_deref(), Some("1000"));
}

/// Scenario 2: demoting the last sealer to observer is rejected with the
/// reserved consensus error code instead of stalling block production.
#[test]
fn consensus_rejects_demoting_the_last_sealer() {
    let executor = started_executor();
    let mut add_body = WordWriter::new();
    add_body.push_dynamic(b"node-1").push_u256(U256::from(10u64));
    let added = executor
        .execute_transaction(tx(addresses::consensus(), encoded_call("addSealer(string,uint256)", add_body.into_bytes())))
        .unwrap();
    assert!(added.is_success());

    let mut demote_body = WordWriter::new();
    demote_body.push_dynamic(b"node-1");
    let demoted = executor
        .execute_transaction(tx(addresses::consensus(), encoded_call("addObserver(string)", demote_body.into_bytes())))
        .unwrap();
    assert!(demoted.is_success());
    assert_eq!(demoted.output.as_ref(), encode_error_code(-51_101).as_slice());
}

/// Scenario 3: inserting the same CNS `(name, version)` pair twice is
/// rejected, the binding stays immutable.
#[test]
fn cns_rejects_a_duplicate_name_and_version() {
    let executor = started_executor();
    let mut body = WordWriter::new();
    body.push_dynamic(b"HelloWorld").push_dynamic(b"1.0").push_dynamic(b"0xabc").push_dynamic(b"[]");
    let input = encoded_call("insert(string,string,string,string)", body.into_bytes());

    let first = executor.execute_transaction(tx(addresses::cns(), input.clone())).unwrap();
    assert!(first.is_success());
    assert_eq!(first.output.as_ref(), encode_error_code(0).as_slice());

    let second = executor.execute_transaction(tx(addresses::cns(), input)).unwrap();
    assert!(second.is_success());
    assert_eq!(second.output.as_ref(), encode_error_code(-51_200).as_slice());
}

/// Scenario 4: a CRUD insert is visible to a subsequent select.
#[test]
fn crud_insert_then_select() {
    let executor = started_executor();
    let mut insert_body = WordWriter::new();
    insert_body.push_dynamic(b"t_demo").push_dynamic(b"alice").push_dynamic(br#"{"balance":"100"}"#);
    let inserted = executor
        .execute_transaction(tx(addresses::crud(), encoded_call("insert(string,string,string)", insert_body.into_bytes())))
        .unwrap();
    assert!(inserted.is_success());

    let mut select_body = WordWriter::new();
    select_body.push_dynamic(b"t_demo").push_dynamic(b"{}");
    let selected = executor
        .call(tx(addresses::crud(), encoded_call("select(string,string)", select_body.into_bytes())))
        .unwrap();
    let rows = WordReader::new(&selected.output).read_string().unwrap();
    assert!(rows.contains("alice"));
}

/// Scenario 5: deploy a storage-backed contract, call it to set and read a
/// slot, then attempt to redeploy at the same CREATE2 address and see the
/// collision rejected instead of silently overwriting the running code.
#[test]
fn deploy_call_then_reject_address_collision() {
    // Runtime: branch on CALLDATASIZE; empty calldata reads slot 0 back,
    // non-empty calldata stores its first word into slot 0.
    let runtime: Vec<u8> = vec![
        0x36, 0x15, 0x60, 0x0c, 0x57, 0x60, 0x00, 0x35, 0x60, 0x00, 0x55, 0x00, 0x5b, 0x60, 0x00, 0x54, 0x60, 0x00,
        0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
    ];
    let mut deploy_payload: Vec<u8> = vec![0x60, 0x18, 0x60, 0x0c, 0x60, 0x00, 0x39, 0x60, 0x18, 0x60, 0x00, 0xf3];
    deploy_payload.extend_from_slice(&runtime);

    let executor = started_executor();
    let salt = B256::from([7u8; 32]);
    let deploy = TransactionInput {
        tx_hash: None,
        from: Address::ZERO,
        to: None,
        input: Bytes::from(deploy_payload.clone()),
        gas: 1_000_000,
        origin: Address::ZERO,
        create_salt: Some(salt),
        static_call: false,
    };

    let deployed = executor.execute_transaction(deploy.clone()).unwrap();
    assert!(deployed.is_success());
    let contract = deployed.new_contract_address.expect("create reports the deployed address");

    let store = executor
        .execute_transaction(tx(contract, U256::from(42u64).to_be_bytes::<32>().to_vec()))
        .unwrap();
    assert!(store.is_success());

    let read = executor.call(tx(contract, Vec::new())).unwrap();
    assert!(read.is_success());
    assert_eq!(read.output.as_ref(), U256::from(42u64).to_be_bytes::<32>().as_slice());

    let redeployed = executor.execute_transaction(deploy).unwrap();
    assert!(!redeployed.is_success());
    assert_eq!(redeployed.status, txexec_context::ExecutionStatus::CallAddressError);
}

/// Scenario 6: `sm2Verify` returns false rather than erroring out when the
/// signature doesn't match the claimed address, instead of treating a
/// verification failure as a call failure.
#[test]
fn sm2_verify_reports_mismatch_as_false_not_an_error() {
    let executor = started_executor();
    let mut body = WordWriter::new();
    body.push_bytes32([9u8; 32]);
    body.push_dynamic(&[0u8; 64]);
    body.push_address(Address::ZERO);
    let verified = executor
        .call(tx(addresses::crypto(), encoded_call("sm2Verify(bytes32,bytes,address)", body.into_bytes())))
        .unwrap();
    assert!(verified.is_success());
    assert_eq!(WordReader::new(&verified.output).read_bool(), Some(false));
}

/// Two `setValueByKey` calls on distinct keys, registered as parallel-safe
/// over their first argument, land in a `dagExecuteTransactions` batch with
/// no edge between them — both writes must still be visible afterward, not
/// just one of them clobbering the other.
#[test]
fn disjoint_parallel_writes_both_land() {
    let executor = started_executor();
    let mut register_body = WordWriter::new();
    register_body
        .push_address(addresses::system_config())
        .push_dynamic(b"setValueByKey(string,string)")
        .push_u256(U256::ZERO);
    let registered = executor
        .execute_transaction(tx(addresses::parallel_config(), encoded_call(
            "registerParallelFunction(address,string,uint256)",
            register_body.into_bytes(),
        )))
        .unwrap();
    assert!(registered.is_success());

    let mut first_body = WordWriter::new();
    first_body.push_dynamic(b"tx_count_limit").push_dynamic(b"1000");
    let mut second_body = WordWriter::new();
    second_body.push_dynamic(b"consensus_timeout_seconds").push_dynamic(b"5");

    let batch = vec![
        tx(addresses::system_config(), encoded_call("setValueByKey(string,string)", first_body.into_bytes())),
        tx(addresses::system_config(), encoded_call("setValueByKey(string,string)", second_body.into_bytes())),
    ];
    let results = executor.dag_execute_transactions(batch).unwrap();
    assert!(results.iter().all(|message| message.is_success()));

    let mut read_first = WordWriter::new();
    read_first.push_dynamic(b"tx_count_limit");
    let first_read = executor
        .call(tx(addresses::system_config(), encoded_call("getValueByKey(string)", read_first.into_bytes())))
        .unwrap();
    assert_eq!(WordReader::new(&first_read.output).read_string().as_deref(), Some("1000"));

    let mut read_second = WordWriter::new();
    read_second.push_dynamic(b"consensus_timeout_seconds");
    let second_read = executor
        .call(tx(addresses::system_config(), encoded_call("getValueByKey(string)", read_second.into_bytes())))
        .unwrap();
    assert_eq!(WordReader::new(&second_read.output).read_string().as_deref(), Some("5"));
}
