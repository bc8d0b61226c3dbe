//! Conflict-DAG construction and concurrent execution for a batch of
//! transactions known ahead of time, as used by `dagExecuteTransactions`.
//!
//! [`criticals::critical_fields`] classifies each transaction, [`dag::ConflictDag`]
//! turns that classification into a schedule, and [`executor::ParallelExecutor`]
//! drains it on a dedicated `rayon` pool.

mod criticals;
mod dag;
mod executor;

pub use criticals::critical_fields;
pub use dag::ConflictDag;
pub use executor::ParallelExecutor;
