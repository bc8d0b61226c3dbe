use txexec_primitives::Address;

macro_rules! system_address {
    ($name:ident, $value:expr) => {
        pub fn $name() -> Address {
            let mut bytes = [0u8; 20];
            bytes[18..20].copy_from_slice(&($value as u16).to_be_bytes());
            Address::from(bytes)
        }
    };
}

system_address!(system_config, 0x1000u16);
system_address!(table_factory, 0x1001u16);
system_address!(crud, 0x1002u16);
system_address!(consensus, 0x1003u16);
system_address!(cns, 0x1004u16);
system_address!(parallel_config, 0x1006u16);
system_address!(file_system, 0x1007u16);
system_address!(contract_auth, 0x1008u16);
system_address!(kv_table_factory, 0x1009u16);
system_address!(crypto, 0x100au16);
system_address!(deploy_wasm, 0x100bu16);
system_address!(permission, 0x100cu16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_are_pairwise_distinct() {
        let all = [
            system_config(),
            table_factory(),
            crud(),
            consensus(),
            cns(),
            parallel_config(),
            file_system(),
            contract_auth(),
            kv_table_factory(),
            crypto(),
            deploy_wasm(),
            permission(),
        ];
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                assert_eq!(i == j, a == b);
            }
        }
    }
}
