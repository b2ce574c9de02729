//! In-memory snapshot store.
//!
//! Deterministic and test-friendly; nothing survives the process.

use crate::{SnapshotStore, StoreError, StoreResult};
use ballot_types::SessionSnapshot;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    snapshot: RwLock<Option<SessionSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self) -> StoreResult<Option<SessionSnapshot>> {
        let guard = self
            .snapshot
            .read()
            .map_err(|_| StoreError::Backend("snapshot lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, snapshot: &SessionSnapshot) -> StoreResult<()> {
        let mut guard = self
            .snapshot
            .write()
            .map_err(|_| StoreError::Backend("snapshot lock poisoned".to_string()))?;
        *guard = Some(snapshot.clone());
        Ok(())
    }
}
