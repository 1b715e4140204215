use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use ledatronic_schema::Snapshot;

/// Latest decoded snapshot, shared between the poll loop and readers.
///
/// Snapshots are swapped whole; a reader never sees a partial update.
#[derive(Debug, Default)]
pub struct SnapshotCell {
    state: RwLock<CellState>,
}

#[derive(Debug, Default)]
struct CellState {
    latest: Option<Arc<Snapshot>>,
    last_update: Option<SystemTime>,
    updates: u64,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot.
    pub fn replace(&self, snapshot: Arc<Snapshot>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.latest = Some(snapshot);
        state.updates += 1;
    }

    /// Record the start of a poll session.
    pub fn mark_poll_started(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.last_update = Some(SystemTime::now());
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .latest
            .clone()
    }

    /// Start time of the most recent poll session.
    pub fn last_update(&self) -> Option<SystemTime> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_update
    }

    /// Snapshots stored since creation.
    pub fn updates(&self) -> u64 {
        self.state.read().unwrap_or_else(PoisonError::into_inner).updates
    }
}

#[cfg(test)]
mod tests {
    use ledatronic_schema::{decode, Schema};

    use super::*;

    #[test]
    fn replace_swaps_whole_snapshot() {
        let cell = SnapshotCell::new();
        assert!(cell.latest().is_none());

        let schema = Schema::ledatronic();
        let first = Arc::new(decode(&[0u8; 56], &schema));
        let second = Arc::new(decode(&[0x01; 56], &schema));

        cell.replace(first.clone());
        let held = cell.latest().unwrap();
        cell.replace(second.clone());

        assert_eq!(held, first);
        assert_eq!(cell.latest().unwrap(), second);
        assert_eq!(cell.updates(), 2);
    }

    #[test]
    fn mark_poll_started_sets_timestamp() {
        let cell = SnapshotCell::new();
        assert!(cell.last_update().is_none());
        cell.mark_poll_started();
        assert!(cell.last_update().is_some());
    }
}
