use serde::{Deserialize, Serialize};

/// VM schedule constants consulted by the executive's gas-accounting
/// formula (`base_gas_required`) and by CREATE's code-storage pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Flat cost of an ordinary message call.
    pub tx_gas: u64,
    /// Flat cost of a CREATE/CREATE2 call, charged instead of `tx_gas`.
    pub tx_create_gas: u64,
    /// Cost per zero byte of call input.
    pub tx_data_zero_gas: u64,
    /// Cost per non-zero byte of call input.
    pub tx_data_non_zero_gas: u64,
    /// Cost per byte of code stored after a successful CREATE.
    pub create_data_gas: u64,
    /// Largest deployed-code size accepted; exceeding it on CREATE success
    /// is treated as `OutOfGas`.
    pub max_code_size: usize,
}

impl Default for Schedule {
    /// The default gas table.
    fn default() -> Self {
        Self {
            tx_gas: 21_000,
            tx_create_gas: 53_000,
            tx_data_zero_gas: 4,
            tx_data_non_zero_gas: 68,
            create_data_gas: 200,
            max_code_size: 24_576,
        }
    }
}
