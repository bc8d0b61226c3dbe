use txexec_abi::{encode_error_code, selector_of, split_selector};
use txexec_context::{BlockContext, Precompiled, PrecompiledError};
use txexec_primitives::Address;
use txexec_state::Entry;

use crate::words::{WordReader, WordWriter};

/// Reserved table for the block file system directory tree, one row per
/// path.
pub const BFS_TABLE: &str = "_sys_bfs_";

const WRITE_COST: i64 = 5_000;
const READ_COST: i64 = 500;

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/".to_owned() } else { trimmed.to_owned() }
}

fn parent_of(path: &str) -> Option<String> {
    let trimmed = path.trim_end_matches('/');
    let idx = trimmed.rfind('/')?;
    Some(if idx == 0 { "/".to_owned() } else { trimmed[..idx].to_owned() })
}

/// `0x1007`: the directory layer consulted when resolving contract names to
/// addresses and when listing deployed contracts (`mkdir`/`list`, entries
/// typed `"directory"` or `"contract"`).
pub struct FileSystemPrecompiled;

impl Precompiled for FileSystemPrecompiled {
    fn call(
        &self,
        ctx: &BlockContext,
        input: &[u8],
        _origin: Address,
        _sender: Address,
    ) -> Result<(i64, Vec<u8>), PrecompiledError> {
        let (selector, body) =
            split_selector(input).ok_or_else(|| PrecompiledError::new("call data too short for a selector"))?;
        let mut reader = WordReader::new(body);
        let state = ctx.state();

        if selector == selector_of("mkdir(string)") {
            let path = normalize(&reader.read_string().ok_or_else(|| PrecompiledError::new("malformed path"))?);
            if state.get_row(BFS_TABLE, &path).map_err(|err| PrecompiledError::new(err.to_string()))?.is_some() {
                return Ok((WRITE_COST, encode_error_code(-1).to_vec()));
            }
            if let Some(parent) = parent_of(&path) {
                if parent != "/" && state.get_row(BFS_TABLE, &parent).map_err(|err| PrecompiledError::new(err.to_string()))?.is_none() {
                    return Err(PrecompiledError::new("parent directory does not exist"));
                }
            }
            let mut row = Entry::new();
            row.set("type", "directory");
            state.set_row(BFS_TABLE, &path, row).map_err(|err| PrecompiledError::new(err.to_string()))?;
            return Ok((WRITE_COST, encode_error_code(0).to_vec()));
        }

        if selector == selector_of("list(string)") {
            let path = normalize(&reader.read_string().ok_or_else(|| PrecompiledError::new("malformed path"))?);
            let keys = state.get_primary_keys(BFS_TABLE, None).map_err(|err| PrecompiledError::new(err.to_string()))?;
            let prefix = if path == "/" { String::new() } else { format!("{path}/") };
            let mut entries = Vec::new();
            for key in keys {
                if let Some(rest) = key.strip_prefix(&prefix) {
                    if !rest.is_empty() && !rest.contains('/') {
                        entries.push(rest.to_owned());
                    }
                }
            }
            entries.sort();
            let mut writer = WordWriter::new();
            writer.push_dynamic(entries.join(",").as_bytes());
            return Ok((READ_COST, writer.into_bytes()));
        }

        Err(PrecompiledError::new("unknown FileSystem selector"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use txexec_context::BlockContextConfig;
    use txexec_state::{InMemoryBackend, StateStorageLayer};

    fn genesis_ctx() -> BlockContext {
        let layer = StateStorageLayer::genesis(0, Arc::new(InMemoryBackend::new()));
        BlockContext::genesis(&BlockContextConfig::default(), layer, HashMap::new(), HashMap::new())
    }

    fn call(ctx: &BlockContext, signature: &str, path: &str) -> Vec<u8> {
        let mut body = WordWriter::new();
        body.push_dynamic(path.as_bytes());
        let mut input = selector_of(signature).to_vec();
        input.extend_from_slice(&body.into_bytes());
        FileSystemPrecompiled.call(ctx, &input, Address::ZERO, Address::ZERO).unwrap().1
    }

    #[test]
    fn mkdir_then_list_sees_the_new_directory() {
        let ctx = genesis_ctx();
        assert_eq!(call(&ctx, "mkdir(string)", "/apps"), encode_error_code(0).to_vec());
        assert_eq!(call(&ctx, "mkdir(string)", "/apps/demo"), encode_error_code(0).to_vec());
        let out = call(&ctx, "list(string)", "/apps");
        assert_eq!(WordReader::new(&out).read_string().as_deref(), Some("demo"));
    }

    #[test]
    fn mkdir_without_existing_parent_errors() {
        let ctx = genesis_ctx();
        let mut body = WordWriter::new();
        body.push_dynamic(b"/missing/child");
        let mut input = selector_of("mkdir(string)").to_vec();
        input.extend_from_slice(&body.into_bytes());
        assert!(FileSystemPrecompiled.call(&ctx, &input, Address::ZERO, Address::ZERO).is_err());
    }
}
