//! In-memory credential store.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::agent::{AgentId, CredentialRecord};
use crate::scope::ScopeSet;

use super::{CredentialStore, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    by_id: HashMap<AgentId, CredentialRecord>,
    by_name: HashMap<String, AgentId>,
}

/// Credential store backed by two maps under one lock.
///
/// Both indexes change under a single write lock, so the name check and
/// the insert are one atomic step.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace an agent's stored scopes. Tokens already issued keep the
    /// scopes they were issued with.
    pub fn set_scopes(&self, id: &AgentId, scopes: ScopeSet) -> StoreResult<()> {
        self.update(id, |record| record.scopes = scopes)
    }

    pub fn len(&self) -> usize {
        self.read().map(|inner| inner.by_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn update<F>(&self, id: &AgentId, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut CredentialRecord),
    {
        let mut inner = self.write()?;
        let record = inner
            .by_id
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        f(record);
        Ok(())
    }
}

impl CredentialStore for MemoryStore {
    fn find_by_name(&self, name: &str) -> StoreResult<Option<CredentialRecord>> {
        let inner = self.read()?;
        Ok(inner
            .by_name
            .get(name)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    fn find_by_id(&self, id: &AgentId) -> StoreResult<Option<CredentialRecord>> {
        Ok(self.read()?.by_id.get(id).cloned())
    }

    fn insert(&self, record: CredentialRecord) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner.by_name.contains_key(&record.name) {
            return Err(StoreError::Conflict(record.name));
        }
        if inner.by_id.contains_key(&record.id) {
            return Err(StoreError::Conflict(record.id.to_string()));
        }
        inner.by_name.insert(record.name.clone(), record.id.clone());
        inner.by_id.insert(record.id.clone(), record);
        Ok(())
    }

    fn update_last_auth(&self, id: &AgentId, timestamp: u64) -> StoreResult<()> {
        self.update(id, |record| record.last_auth_at = Some(timestamp))
    }

    fn set_active(&self, id: &AgentId, active: bool) -> StoreResult<()> {
        self.update(id, |record| record.active = active)
    }

    fn list(&self) -> StoreResult<Vec<CredentialRecord>> {
        Ok(self.read()?.by_id.values().cloned().collect())
    }
}
