use txexec_context::Schedule;

/// Intrinsic gas a transaction must cover before any VM/precompiled work
/// starts: a flat per-kind cost plus a per-byte charge over the call data.
pub fn base_gas_required(schedule: &Schedule, create: bool, data: &[u8]) -> u64 {
    let flat = if create { schedule.tx_create_gas } else { schedule.tx_gas };
    let data_gas: u64 = data
        .iter()
        .map(|&byte| {
            if byte == 0 {
                schedule.tx_data_zero_gas
            } else {
                schedule.tx_data_non_zero_gas
            }
        })
        .sum();
    flat + data_gas
}
