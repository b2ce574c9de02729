//! Snapshot persistence for voting sessions.
//!
//! A session is persisted as a single [`SessionSnapshot`]. Backends
//! implement [`SnapshotStore`]; [`SessionStore`] adds the glue that turns a
//! stored snapshot back into a validated [`VotingSession`].

#![deny(unsafe_code)]

mod error;
mod file;
mod memory;

pub use error::{StoreError, StoreResult};
pub use file::FileSnapshotStore;
pub use memory::InMemorySnapshotStore;

use ballot_engine::{SessionConfig, VotingSession};
use ballot_types::SessionSnapshot;

/// Storage contract for the persisted state of one session
pub trait SnapshotStore: Send + Sync {
    /// The stored snapshot, `None` if nothing was saved yet
    fn load(&self) -> StoreResult<Option<SessionSnapshot>>;

    /// Replace the stored snapshot
    fn save(&self, snapshot: &SessionSnapshot) -> StoreResult<()>;

    fn exists(&self) -> StoreResult<bool> {
        Ok(self.load()?.is_some())
    }
}

/// Loads and persists whole sessions through a [`SnapshotStore`]
pub struct SessionStore<S> {
    backend: S,
    config: SessionConfig,
}

impl<S: SnapshotStore> SessionStore<S> {
    pub fn new(backend: S, config: SessionConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Restore the stored session
    pub fn open(&self) -> StoreResult<VotingSession> {
        let snapshot = self.backend.load()?.ok_or(StoreError::NotFound)?;
        Ok(VotingSession::restore(snapshot, self.config.clone())?)
    }

    /// Store a brand-new session; refuses to overwrite an existing one
    pub fn create(&self, session: &VotingSession) -> StoreResult<()> {
        if self.backend.exists()? {
            return Err(StoreError::Conflict(
                "a session is already stored".to_string(),
            ));
        }
        self.persist(session)
    }

    /// Save the committed state of `session`
    pub fn persist(&self, session: &VotingSession) -> StoreResult<()> {
        let snapshot = session.snapshot();
        self.backend.save(&snapshot)?;
        tracing::debug!(phase = %snapshot.phase, "Session persisted");
        Ok(())
    }
}
