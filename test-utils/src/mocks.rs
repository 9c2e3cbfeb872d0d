//! Store mocks for fault injection and call recording.

use async_trait::async_trait;
use session_verifier::{MemoryStore, TokenStore, VerifierError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Barrier;

/// Store operations, for fault injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// `get`
    Get,
    /// `set`
    Set,
    /// `set_if_absent`
    SetIfAbsent,
    /// `delete`
    Delete,
    /// `delete_by_prefix`
    DeleteByPrefix,
    /// `exists`
    Exists,
}

/// Wraps a [`MemoryStore`], counting calls and failing selected operations.
/// Clones share state.
#[derive(Clone, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    failing: Arc<Mutex<HashSet<StoreOp>>>,
    calls: Arc<Mutex<HashMap<StoreOp, usize>>>,
    get_gate: Arc<Mutex<Option<Arc<Barrier>>>>,
}

impl FaultyStore {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            failing: Arc::default(),
            calls: Arc::default(),
            get_gate: Arc::default(),
        }
    }

    /// Make `op` fail until [`FaultyStore::heal`] is called.
    pub fn fail(&self, op: StoreOp) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(op);
    }

    /// Stop failing every operation.
    pub fn heal(&self) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Hold the next `callers` reads until all of them have arrived, then
    /// release them together. The gate opens once and is then removed.
    pub fn gate_gets(&self, callers: usize) {
        *self.get_gate.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::new(Barrier::new(callers)));
    }

    /// Number of calls made to `op`, failed ones included.
    #[must_use]
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    /// The wrapped store.
    #[must_use]
    pub const fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn enter(&self, op: StoreOp) -> Result<(), VerifierError> {
        *self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(op)
            .or_insert(0) += 1;

        let failing = self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&op);
        if failing {
            Err(VerifierError::store(format!("injected {op:?} failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TokenStore for FaultyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, VerifierError> {
        self.enter(StoreOp::Get)?;

        let gate = self
            .get_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(gate) = gate {
            let value = self.inner.get(key).await;
            if gate.wait().await.is_leader() {
                self.get_gate
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
            }
            return value;
        }

        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), VerifierError> {
        self.enter(StoreOp::Set)?;
        self.inner.set(key, value, ttl).await
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, VerifierError> {
        self.enter(StoreOp::SetIfAbsent)?;
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), VerifierError> {
        self.enter(StoreOp::Delete)?;
        self.inner.delete(key).await
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), VerifierError> {
        self.enter(StoreOp::DeleteByPrefix)?;
        self.inner.delete_by_prefix(prefix).await
    }

    async fn exists(&self, key: &str) -> Result<bool, VerifierError> {
        self.enter(StoreOp::Exists)?;
        self.inner.exists(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fault_injection_and_counting() {
        let store = FaultyStore::default();

        store.set("k", "v", Duration::from_secs(10)).await.unwrap();
        store.fail(StoreOp::Get);
        assert!(store.get("k").await.is_err());

        store.heal();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(store.calls(StoreOp::Get), 2);
        assert_eq!(store.calls(StoreOp::Set), 1);
    }

    #[tokio::test]
    async fn test_gated_reads_see_the_same_snapshot() {
        let store = FaultyStore::default();
        store.set("k", "old", Duration::from_secs(10)).await.unwrap();
        store.gate_gets(2);

        let reader = {
            let store = store.clone();
            tokio::spawn(async move { store.get("k").await })
        };
        let local = store.get("k").await.unwrap();
        store.set("k", "new", Duration::from_secs(10)).await.unwrap();

        assert_eq!(local.as_deref(), Some("old"));
        assert_eq!(reader.await.unwrap().unwrap().as_deref(), Some("old"));

        // Gate is gone after one round
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("new"));
    }
}
