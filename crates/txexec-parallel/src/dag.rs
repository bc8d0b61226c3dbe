use std::collections::{BTreeSet, HashMap};

/// A conflict graph over one transaction batch: edge `i -> j` means `j` must
/// not start before `i` finishes. Built once per batch, then drained by
/// [`crate::executor::ParallelExecutor::execute`] via Kahn's algorithm.
///
/// Each transaction either carries a set of *critical fields* (conflicts
/// only with whichever transaction most recently touched the same field) or
/// none (a "normal" transaction, which conflicts with every transaction
/// seen so far *and* makes every later transaction conflict with it,
/// tracked here by `critical_all`).
pub struct ConflictDag {
    successors: Vec<Vec<usize>>,
    pub(crate) indegree: Vec<usize>,
}

impl ConflictDag {
    pub fn build(criticals: &[Option<Vec<String>>]) -> Self {
        let n = criticals.len();
        let mut successors = vec![Vec::new(); n];
        let mut indegree = vec![0usize; n];
        let mut latest: HashMap<&str, usize> = HashMap::new();
        let mut critical_all: Option<usize> = None;

        for (id, fields) in criticals.iter().enumerate() {
            match fields {
                Some(fields) => {
                    let mut preds = BTreeSet::new();
                    for field in fields {
                        match latest.get(field.as_str()) {
                            Some(&pred) => {
                                preds.insert(pred);
                            }
                            None => {
                                if let Some(pred) = critical_all {
                                    preds.insert(pred);
                                }
                            }
                        }
                    }
                    for pred in preds {
                        successors[pred].push(id);
                        indegree[id] += 1;
                    }
                    for field in fields {
                        latest.insert(field.as_str(), id);
                    }
                }
                None => {
                    let mut preds: BTreeSet<usize> = latest.values().copied().collect();
                    if let Some(pred) = critical_all {
                        preds.insert(pred);
                    }
                    for pred in preds {
                        successors[pred].push(id);
                        indegree[id] += 1;
                    }
                    latest.clear();
                    critical_all = Some(id);
                }
            }
        }

        Self { successors, indegree }
    }

    pub fn len(&self) -> usize {
        self.indegree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indegree.is_empty()
    }

    pub(crate) fn successors(&self) -> &[Vec<usize>] {
        &self.successors
    }
}
