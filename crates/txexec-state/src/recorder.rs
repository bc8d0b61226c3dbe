use crate::entry::Entry;

/// A table's local overlay slot for one key: either a live row the layer
/// holds itself, or a tombstone hiding whatever a deeper layer/backend has.
#[derive(Debug, Clone)]
pub(crate) enum RowSlot {
    Present(Entry),
    Tombstone,
}

/// One undo step: the table and key whose *local* overlay slot is about to
/// change, and what that slot held immediately before (`None` meaning there
/// was no local slot at all — the key fell through to a deeper layer).
#[derive(Debug, Clone)]
pub(crate) struct RecorderEntry {
    pub table: String,
    pub key: String,
    pub previous: Option<RowSlot>,
}

/// An opaque position in a [`Recorder`]'s log, taken by `savepoint()` and
/// consumed by `rollback()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Savepoint(usize);

/// Append-only undo log for one layer's writes during the current execution.
///
/// Every `set_row`/`remove_row` pushes the row's previous local slot here
/// before mutating the layer. `rollback` replays the log in reverse back to
/// a savepoint, restoring each captured slot; deeper layers are never
/// touched, since a write only ever mutates the top layer.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    log: Vec<RecorderEntry>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: RecorderEntry) {
        self.log.push(entry);
    }

    pub fn savepoint(&self) -> Savepoint {
        Savepoint(self.log.len())
    }

    /// Pops log entries back to `savepoint`, returning them in the LIFO
    /// order they must be restored in.
    pub fn drain_to(&mut self, savepoint: Savepoint) -> Vec<RecorderEntry> {
        self.log.split_off(savepoint.0).into_iter().rev().collect()
    }
}
