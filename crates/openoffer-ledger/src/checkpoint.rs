//! Snapshot-and-restore for collaborator state.
//!
//! The settlement engine runs every operation as all-or-nothing: it takes a
//! checkpoint of each collaborator before the operation and rolls back to it
//! if any step fails.

/// State that can be captured and restored wholesale.
pub trait Checkpoint {
    type Snapshot;

    /// Capture the current state.
    fn checkpoint(&self) -> Self::Snapshot;

    /// Restore a previously captured state, discarding everything since.
    fn rollback(&mut self, snapshot: Self::Snapshot);
}
