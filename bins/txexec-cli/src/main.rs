use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use serde::Deserialize;

use txexec::{BlockHeader, Executor};
use txexec_context::TransactionInput;
use txexec_evm::BytecodeInterpreter;
use txexec_primitives::{Address, Bytes, B256};

/// Drives `txexec::Executor` over a genesis seed and a transaction batch
/// read from JSON fixtures, printing each transaction's receipt and the
/// resulting table hashes.
#[derive(Parser, Debug)]
struct Cli {
    /// JSON array of `{table, key, fields}` rows to seed before block 1.
    #[arg(long)]
    genesis: Option<PathBuf>,
    /// JSON array of transactions to run in block 1, in order.
    #[arg(long)]
    batch: PathBuf,
    /// Gas limit the genesis block header carries.
    #[arg(long, default_value_t = 3_000_000_000)]
    gas_limit: u64,
}

#[derive(Debug, Deserialize)]
struct GenesisRow {
    table: String,
    key: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct TxFixture {
    from: String,
    /// Absent means CREATE.
    to: Option<String>,
    /// Hex-encoded call data or init code, with or without a `0x` prefix.
    input: String,
    gas: i64,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    create_salt: Option<String>,
}

fn parse_address(raw: &str) -> Result<Address> {
    Address::from_str(raw).with_context(|| format!("invalid address {raw:?}"))
}

fn parse_hash(raw: &str) -> Result<B256> {
    B256::from_str(raw).with_context(|| format!("invalid hash {raw:?}"))
}

fn parse_hex(raw: &str) -> Result<Bytes> {
    let trimmed = raw.strip_prefix("0x").unwrap_or(raw);
    Ok(Bytes::from(hex::decode(trimmed).with_context(|| format!("invalid hex payload {raw:?}"))?))
}

impl TxFixture {
    fn into_input(self) -> Result<TransactionInput> {
        let from = parse_address(&self.from)?;
        let origin = match &self.origin {
            Some(raw) => parse_address(raw)?,
            None => from,
        };
        Ok(TransactionInput {
            tx_hash: None,
            from,
            to: self.to.as_deref().map(parse_address).transpose()?,
            input: parse_hex(&self.input)?,
            gas: self.gas,
            origin,
            create_salt: self.create_salt.as_deref().map(parse_hash).transpose()?,
            static_call: false,
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let executor = Executor::in_memory(Arc::new(BytecodeInterpreter));
    executor.next_block_header(BlockHeader::genesis(cli.gas_limit));

    if let Some(genesis_path) = &cli.genesis {
        let raw = std::fs::read_to_string(genesis_path)
            .with_context(|| format!("reading genesis seed {}", genesis_path.display()))?;
        let rows: Vec<GenesisRow> = serde_json::from_str(&raw).context("parsing genesis seed JSON")?;
        for row in rows {
            executor.seed_row(&row.table, &row.key, row.fields)?;
        }
    }

    let raw =
        std::fs::read_to_string(&cli.batch).with_context(|| format!("reading batch {}", cli.batch.display()))?;
    let fixtures: Vec<TxFixture> = serde_json::from_str(&raw).context("parsing transaction batch JSON")?;

    for (index, fixture) in fixtures.into_iter().enumerate() {
        let input = fixture.into_input()?;
        let receipt = executor.execute_transaction(input)?;
        println!(
            "tx[{index}]: status={:?} gas_used={} output=0x{} new_contract={:?}",
            receipt.status,
            receipt.gas_used,
            hex::encode(&receipt.output),
            receipt.new_contract_address,
        );
        if !receipt.revert_reason.is_empty() {
            println!("  revert_reason: {}", receipt.revert_reason);
        }
    }

    for (table, hash) in executor.get_table_hashes(0)? {
        println!("table {table}: {hash}");
    }

    Ok(())
}
