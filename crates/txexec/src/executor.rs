use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use txexec_context::{
    BlockContext, BlockHeader, EthereumPrecompiled, ExecutorConfig, Precompiled, TransactionInput,
};
use txexec_executive::{SyncCallDispatcher, Vm};
use txexec_parallel::{critical_fields, ConflictDag, ParallelExecutor};
use txexec_primitives::{Address, BlockNumber, B256};
use txexec_state::{InMemoryBackend, StateBackend, StateStorageLayer};

use crate::error::ExecutorError;
use crate::receipt::ExecutionMessage;

/// Owns the block lifecycle and routes every inbound operation spec §4.8
/// names: `nextBlockHeader`, `executeTransaction`, `call`,
/// `dagExecuteTransactions`, `getTableHashes`, and the `prepare`/`commit`/
/// `rollback`/`reset` 2PC boundary.
///
/// All state mutation goes through a single [`txexec_state::LayerStack`];
/// `BlockContext`s are rebuilt (cheaply — they are thin wrappers over an
/// `Arc<StateStorageLayer>` plus the fixed precompiled catalogue) whenever
/// the stack's head changes, and kept per block number so `getTableHashes`
/// and `call`'s throwaway layer can both reach a specific block's view.
pub struct Executor {
    config: ExecutorConfig,
    layer_stack: Mutex<txexec_state::LayerStack>,
    constant_precompiled: HashMap<Address, Arc<dyn Precompiled>>,
    ethereum_precompiled: HashMap<Address, Arc<dyn EthereumPrecompiled>>,
    vm: Arc<dyn Vm>,
    parallel: ParallelExecutor,
    contexts: Mutex<HashMap<BlockNumber, Arc<BlockContext>>>,
    current_ctx: Mutex<Option<Arc<BlockContext>>>,
    context_id_counter: AtomicU64,
}

impl Executor {
    /// Builds an executor over `backend`, the node-wide `config`, and `vm`
    /// as the code-backed call machine's bytecode interpreter. Uses the
    /// full fixed precompiled catalogue and no Ethereum-compatible
    /// precompiles (none are implemented in this workspace).
    pub fn new(backend: Arc<dyn StateBackend>, config: ExecutorConfig, vm: Arc<dyn Vm>) -> Self {
        Self::with_catalogue(backend, config, vm, txexec_precompiled::constant_catalogue(), HashMap::new())
    }

    /// As [`Self::new`], but with an explicit precompiled catalogue —
    /// useful for tests that only want a handful of addresses wired up.
    pub fn with_catalogue(
        backend: Arc<dyn StateBackend>,
        config: ExecutorConfig,
        vm: Arc<dyn Vm>,
        constant_precompiled: HashMap<Address, Arc<dyn Precompiled>>,
        ethereum_precompiled: HashMap<Address, Arc<dyn EthereumPrecompiled>>,
    ) -> Self {
        let parallel = ParallelExecutor::new(config.dag_workers, config.dag_timeout_ms);
        Self {
            layer_stack: Mutex::new(txexec_state::LayerStack::new(backend)),
            constant_precompiled,
            ethereum_precompiled,
            vm,
            parallel,
            contexts: Mutex::new(HashMap::new()),
            current_ctx: Mutex::new(None),
            context_id_counter: AtomicU64::new(1),
            config,
        }
    }

    /// Convenience constructor for tests and the CLI: an in-memory
    /// backend, default config.
    pub fn in_memory(vm: Arc<dyn Vm>) -> Self {
        Self::new(Arc::new(InMemoryBackend::new()), ExecutorConfig::default(), vm)
    }

    fn next_context_id(&self) -> u64 {
        self.context_id_counter.fetch_add(1, Ordering::SeqCst)
    }

    fn require_context(&self) -> Result<Arc<BlockContext>, ExecutorError> {
        self.current_ctx.lock().expect("lock poisoned").clone().ok_or(ExecutorError::NoActiveBlock)
    }

    /// Pushes a new overlay layer for `header.number` and makes it the
    /// head every subsequent operation reads and writes through.
    #[tracing::instrument(skip(self, header), fields(number = header.number))]
    pub fn next_block_header(&self, header: BlockHeader) {
        let number = header.number;
        let layer = {
            let mut stack = self.layer_stack.lock().expect("lock poisoned");
            stack.next_block_header(number);
            stack.head()
        };
        let ctx = Arc::new(BlockContext::new(
            header,
            &self.config.block,
            layer,
            self.constant_precompiled.clone(),
            self.ethereum_precompiled.clone(),
            HashMap::new(),
        ));
        self.contexts.lock().expect("lock poisoned").insert(number, ctx.clone());
        *self.current_ctx.lock().expect("lock poisoned") = Some(ctx);
    }

    /// Routes `input` to a fresh top-level executive over the current
    /// block's head layer.
    #[tracing::instrument(skip(self, input))]
    pub fn execute_transaction(&self, input: TransactionInput) -> Result<ExecutionMessage, ExecutorError> {
        let ctx = self.require_context()?;
        let dispatcher = SyncCallDispatcher::new(ctx.clone(), self.vm.clone(), self.next_context_id());
        let gas_limit = input.gas;
        let result = txexec_executive::dispatch(&ctx, &input, self.vm.as_ref(), dispatcher);
        Ok(ExecutionMessage::from_result(gas_limit, result))
    }

    /// A static call: routed over a throwaway layer stacked on the current
    /// head, discarded when this call returns. Nothing it writes is ever
    /// reachable from `next_block_header`/`getTableHashes` again.
    #[tracing::instrument(skip(self, input))]
    pub fn call(&self, mut input: TransactionInput) -> Result<ExecutionMessage, ExecutorError> {
        let ctx = self.require_context()?;
        input.static_call = true;
        let throwaway_layer = StateStorageLayer::push(ctx.state().clone(), ctx.header.number);
        let throwaway_ctx = Arc::new(BlockContext::new(
            ctx.header.clone(),
            &self.config.block,
            throwaway_layer,
            self.constant_precompiled.clone(),
            self.ethereum_precompiled.clone(),
            HashMap::new(),
        ));
        let dispatcher = SyncCallDispatcher::new(throwaway_ctx.clone(), self.vm.clone(), self.next_context_id());
        let gas_limit = input.gas;
        let result = txexec_executive::dispatch(&throwaway_ctx, &input, self.vm.as_ref(), dispatcher);
        Ok(ExecutionMessage::from_result(gas_limit, result))
    }

    /// Classifies every input's critical fields, builds the conflict DAG,
    /// and drains it on the parallel worker pool; independent chains run
    /// concurrently, dependent ones run in submission order.
    #[tracing::instrument(skip(self, inputs), fields(batch_size = inputs.len()))]
    pub fn dag_execute_transactions(
        &self,
        inputs: Vec<TransactionInput>,
    ) -> Result<Vec<ExecutionMessage>, ExecutorError> {
        let ctx = self.require_context()?;
        let criticals: Vec<Option<Vec<String>>> = inputs.iter().map(|tx| critical_fields(&ctx, tx)).collect();
        let dag = ConflictDag::build(&criticals);
        let results: Vec<Mutex<Option<ExecutionMessage>>> = (0..inputs.len()).map(|_| Mutex::new(None)).collect();

        self.parallel.execute(&dag, |id| {
            let input = &inputs[id];
            let dispatcher = SyncCallDispatcher::new(ctx.clone(), self.vm.clone(), self.next_context_id());
            let gas_limit = input.gas;
            let result = txexec_executive::dispatch(&ctx, input, self.vm.as_ref(), dispatcher);
            *results[id].lock().expect("lock poisoned") = Some(ExecutionMessage::from_result(gas_limit, result));
        });

        Ok(results
            .into_iter()
            .map(|cell| cell.into_inner().expect("lock poisoned").expect("every DAG node runs exactly once"))
            .collect())
    }

    /// Writes `fields` into `table` at `key` on the current block's layer
    /// directly, bypassing every precompiled/VM call path. Meant for
    /// bootstrapping genesis state (seeding `_sys_config_`, the initial
    /// sealer set, ...) before any transaction runs, not for ordinary
    /// execution.
    pub fn seed_row(&self, table: &str, key: &str, fields: HashMap<String, String>) -> Result<(), ExecutorError> {
        let ctx = self.require_context()?;
        let mut row = txexec_state::Entry::new();
        for (field, value) in fields {
            row.set(field, value);
        }
        ctx.state().set_row(table, key, row)?;
        Ok(())
    }

    /// The name/hash pairs of every table touched at or before `number`'s
    /// layer, as recorded when that block's context was built.
    pub fn get_table_hashes(&self, number: BlockNumber) -> Result<Vec<(String, B256)>, ExecutorError> {
        let contexts = self.contexts.lock().expect("lock poisoned");
        let ctx = contexts.get(&number).ok_or(ExecutorError::UnknownBlock(number))?;
        Ok(ctx.state().table_hashes()?)
    }

    /// `true` iff `number` names the layer currently eligible for commit —
    /// a backend-facing caller should only durably write after this.
    pub fn prepare(&self, number: BlockNumber) -> bool {
        self.layer_stack
            .lock()
            .expect("lock poisoned")
            .uncommitted_head()
            .is_some_and(|layer| layer.block_number() == number)
    }

    /// Marks `number`'s layer durably committed and advances the stack's
    /// cursor past it.
    pub fn commit(&self, number: BlockNumber) -> bool {
        self.layer_stack.lock().expect("lock poisoned").commit(number)
    }

    /// Drops `number`'s layer and everything built on top of it, restoring
    /// the view as of the previous successful `commit`.
    #[tracing::instrument(skip(self), fields(number))]
    pub fn rollback(&self, number: BlockNumber) -> bool {
        let mut stack = self.layer_stack.lock().expect("lock poisoned");
        if !stack.rollback(number) {
            return false;
        }
        let mut contexts = self.contexts.lock().expect("lock poisoned");
        contexts.retain(|&n, _| n < number);
        let new_current = if stack.is_empty() { None } else { contexts.get(&stack.head().block_number()).cloned() };
        drop(contexts);
        *self.current_ctx.lock().expect("lock poisoned") = new_current;
        true
    }

    /// Discards every layer, every recorded block context, and therefore
    /// every in-flight executive directory along with them.
    #[tracing::instrument(skip(self))]
    pub fn reset(&self) {
        self.layer_stack.lock().expect("lock poisoned").reset();
        self.contexts.lock().expect("lock poisoned").clear();
        *self.current_ctx.lock().expect("lock poisoned") = None;
    }
}
