use txexec_primitives::{Address, Bytes, B256, U256};
use txexec_state::{Entry, StateStorageLayer};

/// Reserved table (bypasses the public `create_table` validation path, as
/// every system table does) holding one row per touched address:
/// `balance`, `frozen`, `code_hash`.
pub const ACCOUNTS_TABLE: &str = "_sys_accounts_";
/// Reserved table holding deployed bytecode, keyed by address.
pub const CODE_TABLE: &str = "_sys_code_";

fn key(address: Address) -> String {
    format!("{address:x}")
}

fn storage_table(address: Address) -> String {
    format!("_storage_{address:x}_")
}

pub fn account_exists(state: &StateStorageLayer, address: Address) -> bool {
    state
        .get_row(ACCOUNTS_TABLE, &key(address))
        .ok()
        .flatten()
        .is_some()
}

pub fn balance_of(state: &StateStorageLayer, address: Address) -> U256 {
    state
        .get_row(ACCOUNTS_TABLE, &key(address))
        .ok()
        .flatten()
        .and_then(|row| row.get("balance").and_then(|s| s.parse().ok()))
        .unwrap_or_default()
}

pub fn set_balance(state: &StateStorageLayer, address: Address, balance: U256) {
    let mut row = state
        .get_row(ACCOUNTS_TABLE, &key(address))
        .ok()
        .flatten()
        .unwrap_or_default();
    row.set("balance", balance.to_string());
    let _ = state.set_row(ACCOUNTS_TABLE, &key(address), row);
}

pub fn nonce_of(state: &StateStorageLayer, address: Address) -> u64 {
    state
        .get_row(ACCOUNTS_TABLE, &key(address))
        .ok()
        .flatten()
        .and_then(|row| row.get("nonce").and_then(|s| s.parse().ok()))
        .unwrap_or_default()
}

/// Reads the current nonce, then stores it incremented by one; returns the
/// value CREATE should use (the nonce *before* the increment).
pub fn next_nonce(state: &StateStorageLayer, address: Address) -> u64 {
    let current = nonce_of(state, address);
    let mut row = state
        .get_row(ACCOUNTS_TABLE, &key(address))
        .ok()
        .flatten()
        .unwrap_or_default();
    row.set("nonce", (current + 1).to_string());
    let _ = state.set_row(ACCOUNTS_TABLE, &key(address), row);
    current
}

pub fn is_frozen(state: &StateStorageLayer, address: Address) -> bool {
    state
        .get_row(ACCOUNTS_TABLE, &key(address))
        .ok()
        .flatten()
        .and_then(|row| row.get("frozen").map(|s| s == "1"))
        .unwrap_or(false)
}

/// Marks `address` for deletion at block end. Balance transfer on suicide
/// is deliberately not performed (see DESIGN.md's Open Question note).
pub fn suicide(state: &StateStorageLayer, address: Address) {
    let mut row = state
        .get_row(ACCOUNTS_TABLE, &key(address))
        .ok()
        .flatten()
        .unwrap_or_default();
    row.set("frozen", "1");
    let _ = state.set_row(ACCOUNTS_TABLE, &key(address), row);
}

pub fn code_of(state: &StateStorageLayer, address: Address) -> Bytes {
    state
        .get_row(CODE_TABLE, &key(address))
        .ok()
        .flatten()
        .and_then(|row| row.get("code").map(|hex_str| hex_decode(hex_str)))
        .unwrap_or_default()
}

pub fn set_code(state: &StateStorageLayer, address: Address, code: &Bytes) {
    let mut row = Entry::new();
    row.set("code", hex_encode(code));
    let _ = state.set_row(CODE_TABLE, &key(address), row);

    let mut account_row = state
        .get_row(ACCOUNTS_TABLE, &key(address))
        .ok()
        .flatten()
        .unwrap_or_default();
    account_row.set("code_hash", txexec_primitives::keccak256(code).to_string());
    let _ = state.set_row(ACCOUNTS_TABLE, &key(address), account_row);
}

pub fn code_hash_of(state: &StateStorageLayer, address: Address) -> B256 {
    state
        .get_row(ACCOUNTS_TABLE, &key(address))
        .ok()
        .flatten()
        .and_then(|row| row.get("code_hash").and_then(|s| s.parse().ok()))
        .unwrap_or_default()
}

pub fn storage_get(state: &StateStorageLayer, address: Address, storage_key: U256) -> U256 {
    let table = storage_table(address);
    state
        .get_row(&table, &format!("{storage_key:x}"))
        .ok()
        .flatten()
        .and_then(|row| row.get("value").and_then(|s| s.parse().ok()))
        .unwrap_or_default()
}

pub fn storage_set(state: &StateStorageLayer, address: Address, storage_key: U256, value: U256) {
    let table = storage_table(address);
    let mut row = Entry::new();
    row.set("value", value.to_string());
    let _ = state.set_row(&table, &format!("{storage_key:x}"), row);
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Bytes {
    let out: Vec<u8> = (0..s.len() / 2)
        .filter_map(|i| u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok())
        .collect();
    Bytes::from(out)
}
