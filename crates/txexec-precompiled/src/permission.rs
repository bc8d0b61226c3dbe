use txexec_abi::{encode_error_code, selector_of, split_selector};
use txexec_context::{BlockContext, Precompiled, PrecompiledError};
use txexec_primitives::Address;
use txexec_state::Entry;

use crate::words::WordReader;

/// Reserved table for table-level access grants, keyed by `table:account`.
pub const PERMISSION_TABLE: &str = "_sys_permission_";

const WRITE_COST: i64 = 5_000;
const READ_COST: i64 = 200;

fn grant_key(table: &str, account: Address) -> String {
    format!("{table}:{account}")
}

/// `0x100c`: grants/revokes one account's write access to one user table.
/// Every user table except the system catalogue (`_sys_*`) is otherwise
/// writable by any account; a row here narrows that to the listed grantees.
pub struct PermissionPrecompiled;

impl Precompiled for PermissionPrecompiled {
    fn call(
        &self,
        ctx: &BlockContext,
        input: &[u8],
        _origin: Address,
        sender: Address,
    ) -> Result<(i64, Vec<u8>), PrecompiledError> {
        let (selector, body) =
            split_selector(input).ok_or_else(|| PrecompiledError::new("call data too short for a selector"))?;
        let mut reader = WordReader::new(body);

        if selector == selector_of("insert(string,address)") {
            let table = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed table name"))?;
            let account = reader.read_address().ok_or_else(|| PrecompiledError::new("malformed account"))?;
            if !has_write_access(ctx, &table, sender) {
                return Err(PrecompiledError::new("sender is not authorized to grant access on this table"));
            }
            let mut row = Entry::new();
            row.set("enable_num", ctx.header.number.to_string());
            ctx.state()
                .set_row(PERMISSION_TABLE, &grant_key(&table, account), row)
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((WRITE_COST, encode_error_code(0).to_vec()));
        }

        if selector == selector_of("remove(string,address)") {
            let table = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed table name"))?;
            let account = reader.read_address().ok_or_else(|| PrecompiledError::new("malformed account"))?;
            if !has_write_access(ctx, &table, sender) {
                return Err(PrecompiledError::new("sender is not authorized to revoke access on this table"));
            }
            ctx.state()
                .remove_row(PERMISSION_TABLE, &grant_key(&table, account))
                .map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((WRITE_COST, encode_error_code(0).to_vec()));
        }

        if selector == selector_of("queryPermission(string,address)") {
            let table = reader.read_string().ok_or_else(|| PrecompiledError::new("malformed table name"))?;
            let account = reader.read_address().ok_or_else(|| PrecompiledError::new("malformed account"))?;
            return Ok((READ_COST, encode_error_code(has_write_access(ctx, &table, account) as i64).to_vec()));
        }

        Err(PrecompiledError::new("unknown Permission selector"))
    }
}

/// A table with no grant rows at all is ungoverned (any account may write
/// it); once the first grant is inserted, only listed accounts may.
pub fn has_write_access(ctx: &BlockContext, table: &str, account: Address) -> bool {
    let prefix = format!("{table}:");
    let keys = match ctx.state().get_primary_keys(PERMISSION_TABLE, None) {
        Ok(keys) => keys,
        Err(_) => return true,
    };
    let governed: Vec<&String> = keys.iter().filter(|key| key.starts_with(&prefix)).collect();
    if governed.is_empty() {
        return true;
    }
    governed.iter().any(|key| key.as_str() == grant_key(table, account))
}
