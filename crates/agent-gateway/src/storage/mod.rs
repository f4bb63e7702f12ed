//! Storage for credential records.
//!
//! The gateway reaches agent records only through [`CredentialStore`], a
//! narrow repository trait. Any engine that provides atomic
//! compare-and-insert on the agent name can back it.
//!
//! # Modules
//!
//! - [`memory_store`]: in-process maps, for tests and embedding.
//! - [`file_store`]: one JSON file per record with a name index
//!   directory, written atomically.

pub mod file_store;
pub mod memory_store;

use std::sync::Arc;

use crate::agent::{AgentId, CredentialRecord};

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

/// Errors a store can report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with this name already exists.
    #[error("name already taken: {0}")]
    Conflict(String),

    /// No record with this id.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The backing storage cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Stored data cannot be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Repository of credential records.
pub trait CredentialStore: Send + Sync {
    /// Look up a record by its unique name.
    fn find_by_name(&self, name: &str) -> StoreResult<Option<CredentialRecord>>;

    /// Look up a record by id.
    fn find_by_id(&self, id: &AgentId) -> StoreResult<Option<CredentialRecord>>;

    /// Insert a new record. Fails with [`StoreError::Conflict`] when the
    /// name is taken; of several concurrent inserts for one name, exactly
    /// one succeeds.
    fn insert(&self, record: CredentialRecord) -> StoreResult<()>;

    /// Record a successful login.
    fn update_last_auth(&self, id: &AgentId, timestamp: u64) -> StoreResult<()>;

    /// Set the liveness flag.
    fn set_active(&self, id: &AgentId, active: bool) -> StoreResult<()>;

    /// All records, in no particular order.
    fn list(&self) -> StoreResult<Vec<CredentialRecord>>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    fn find_by_name(&self, name: &str) -> StoreResult<Option<CredentialRecord>> {
        (**self).find_by_name(name)
    }

    fn find_by_id(&self, id: &AgentId) -> StoreResult<Option<CredentialRecord>> {
        (**self).find_by_id(id)
    }

    fn insert(&self, record: CredentialRecord) -> StoreResult<()> {
        (**self).insert(record)
    }

    fn update_last_auth(&self, id: &AgentId, timestamp: u64) -> StoreResult<()> {
        (**self).update_last_auth(id, timestamp)
    }

    fn set_active(&self, id: &AgentId, active: bool) -> StoreResult<()> {
        (**self).set_active(id, active)
    }

    fn list(&self) -> StoreResult<Vec<CredentialRecord>> {
        (**self).list()
    }
}
