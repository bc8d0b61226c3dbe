use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::dag::ConflictDag;

/// Runs a [`ConflictDag`] to completion on a dedicated `rayon` pool, using
/// Kahn's algorithm: a node is spawned as a task the instant its indegree
/// reaches zero, so independent chains progress concurrently without ever
/// materializing a full "round" barrier. Expressed as recursive
/// `rayon::Scope` spawns rather than a condvar-guarded ready queue, since
/// `rayon`'s pool already does the work-stealing such a queue would provide.
pub struct ParallelExecutor {
    pool: rayon::ThreadPool,
    timeout: Duration,
}

impl ParallelExecutor {
    /// `workers` and `timeout_ms` come from `ExecutorConfig::dag_workers`/
    /// `dag_timeout_ms`.
    pub fn new(workers: usize, timeout_ms: u64) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .expect("building the DAG worker pool");
        Self {
            pool,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Executes every node of `dag`, calling `exec(id)` for each. `exec`
    /// must be safe to call concurrently for nodes with no path between
    /// them; the DAG's edges are exactly the guarantee that call order
    /// along any path is preserved.
    ///
    /// A batch that runs longer than the configured timeout is logged as a
    /// warning, not aborted: this executor has no way to safely interrupt a
    /// transaction mid-VM-execution, so the budget is advisory only.
    pub fn execute<F>(&self, dag: &ConflictDag, exec: F)
    where
        F: Fn(usize) + Sync,
    {
        if dag.is_empty() {
            return;
        }
        let start = Instant::now();
        let indegree: Vec<AtomicUsize> = dag.indegree.iter().map(|&d| AtomicUsize::new(d)).collect();
        let successors = dag.successors();
        let exec_ref = &exec;
        let indegree_ref = &indegree;

        self.pool.scope(|scope| {
            for (id, &initial) in dag.indegree.iter().enumerate() {
                if initial == 0 {
                    scope.spawn(move |s| run_node(s, id, successors, indegree_ref, exec_ref));
                }
            }
        });

        let elapsed = start.elapsed();
        if elapsed > self.timeout {
            tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = self.timeout.as_millis() as u64,
                nodes = dag.len(),
                "parallel batch exceeded its wall-clock budget"
            );
        }
    }
}

fn run_node<'scope, F>(
    scope: &rayon::Scope<'scope>,
    id: usize,
    successors: &'scope [Vec<usize>],
    indegree: &'scope [AtomicUsize],
    exec: &'scope F,
) where
    F: Fn(usize) + Sync,
{
    exec(id);
    for &successor in &successors[id] {
        if indegree[successor].fetch_sub(1, Ordering::SeqCst) == 1 {
            scope.spawn(move |s| run_node(s, successor, successors, indegree, exec));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn executes_every_node_exactly_once() {
        let criticals = vec![
            Some(vec!["a".to_owned()]),
            Some(vec!["a".to_owned()]),
            Some(vec!["b".to_owned()]),
            None,
        ];
        let dag = ConflictDag::build(&criticals);
        let executor = ParallelExecutor::new(2, 1_000);
        let seen = Mutex::new(Vec::new());
        executor.execute(&dag, |id| seen.lock().unwrap().push(id));
        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn respects_chain_order_on_a_shared_critical_field() {
        let criticals = vec![Some(vec!["a".to_owned()]), Some(vec!["a".to_owned()]), Some(vec!["a".to_owned()])];
        let dag = ConflictDag::build(&criticals);
        let executor = ParallelExecutor::new(4, 1_000);
        let order = Mutex::new(Vec::new());
        executor.execute(&dag, |id| order.lock().unwrap().push(id));
        assert_eq!(order.into_inner().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn empty_dag_executes_nothing() {
        let dag = ConflictDag::build(&[]);
        let executor = ParallelExecutor::new(1, 1_000);
        let count = AtomicUsize::new(0);
        executor.execute(&dag, |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
