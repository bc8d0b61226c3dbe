use thiserror::Error;
use txexec_primitives::{Address, U256};
use txexec_state::{Entry, StateStorageLayer};

/// Registry of every asset ever registered, one row per asset name.
pub const ASSET_INFO_TABLE: &str = "_sys_asset_info_";

fn balance_table(asset_name: &str) -> String {
    format!("_asset_{asset_name}_")
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AssetError {
    #[error("asset already registered")]
    AlreadyRegistered,
    #[error("asset not registered")]
    NotRegistered,
    #[error("insufficient asset balance")]
    InsufficientBalance,
}

/// Registers a new fungible or non-fungible asset, minting `total_supply`
/// to `issuer`. Table-driven, not balance-driven: ordinary accounts have no
/// notion of asset balance outside these reserved tables.
pub fn register(
    state: &StateStorageLayer,
    asset_name: &str,
    issuer: Address,
    total_supply: U256,
    fungible: bool,
) -> Result<(), AssetError> {
    if state
        .get_row(ASSET_INFO_TABLE, asset_name)
        .ok()
        .flatten()
        .is_some()
    {
        return Err(AssetError::AlreadyRegistered);
    }
    let mut info = Entry::new();
    info.set("issuer", format!("{issuer:x}"));
    info.set("total_supply", total_supply.to_string());
    info.set("fungible", if fungible { "1" } else { "0" });
    let _ = state.set_row(ASSET_INFO_TABLE, asset_name, info);

    let mut balance = Entry::new();
    balance.set("value", total_supply.to_string());
    let _ = state.set_row(&balance_table(asset_name), &format!("{issuer:x}"), balance);
    Ok(())
}

pub fn balance_of(state: &StateStorageLayer, asset_name: &str, account: Address) -> U256 {
    state
        .get_row(&balance_table(asset_name), &format!("{account:x}"))
        .ok()
        .flatten()
        .and_then(|row| row.get("value").and_then(|s| s.parse().ok()))
        .unwrap_or_default()
}

pub fn transfer(
    state: &StateStorageLayer,
    asset_name: &str,
    from: Address,
    to: Address,
    amount: U256,
) -> Result<(), AssetError> {
    if state
        .get_row(ASSET_INFO_TABLE, asset_name)
        .ok()
        .flatten()
        .is_none()
    {
        return Err(AssetError::NotRegistered);
    }
    let from_balance = balance_of(state, asset_name, from);
    if from_balance < amount {
        return Err(AssetError::InsufficientBalance);
    }
    let to_balance = balance_of(state, asset_name, to);

    let table = balance_table(asset_name);
    let mut from_row = Entry::new();
    from_row.set("value", (from_balance - amount).to_string());
    let _ = state.set_row(&table, &format!("{from:x}"), from_row);

    let mut to_row = Entry::new();
    to_row.set("value", (to_balance + amount).to_string());
    let _ = state.set_row(&table, &format!("{to:x}"), to_row);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use txexec_state::InMemoryBackend;

    fn layer() -> Arc<StateStorageLayer> {
        StateStorageLayer::genesis(0, Arc::new(InMemoryBackend::new()))
    }

    #[test]
    fn register_then_transfer_moves_balance() {
        let state = layer();
        let issuer = Address::repeat_byte(1);
        let receiver = Address::repeat_byte(2);
        register(&state, "coin", issuer, U256::from(1_000u64), true).unwrap();
        transfer(&state, "coin", issuer, receiver, U256::from(100u64)).unwrap();
        assert_eq!(balance_of(&state, "coin", issuer), U256::from(900u64));
        assert_eq!(balance_of(&state, "coin", receiver), U256::from(100u64));
    }

    #[test]
    fn double_registration_is_rejected() {
        let state = layer();
        let issuer = Address::repeat_byte(1);
        register(&state, "coin", issuer, U256::from(1u64), true).unwrap();
        assert_eq!(
            register(&state, "coin", issuer, U256::from(1u64), true).unwrap_err(),
            AssetError::AlreadyRegistered
        );
    }

    #[test]
    fn transfer_beyond_balance_is_rejected() {
        let state = layer();
        let issuer = Address::repeat_byte(1);
        let receiver = Address::repeat_byte(2);
        register(&state, "coin", issuer, U256::from(10u64), true).unwrap();
        assert_eq!(
            transfer(&state, "coin", issuer, receiver, U256::from(11u64)).unwrap_err(),
            AssetError::InsufficientBalance
        );
    }
}
