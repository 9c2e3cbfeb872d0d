//! In-process token store.
//!
//! Entries carry an absolute expiry taken from an injectable clock, so tests
//! can drive TTLs without sleeping. Expiry is lazy on read; expired entries
//! are swept on write once the map grows past `purge_threshold`.

use super::TokenStore;
use crate::clock::{self, TimeFn};
use crate::error::VerifierError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

const DEFAULT_PURGE_THRESHOLD: usize = 10_000;

struct Entry {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Store keeping everything in a shared map. Clones share state.
#[derive(Clone)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    time_fn: TimeFn,
    purge_threshold: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Store on the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_time_fn(clock::system_time())
    }

    /// Store whose TTLs are measured against `time_fn`.
    #[must_use]
    pub fn with_time_fn(time_fn: TimeFn) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            time_fn,
            purge_threshold: DEFAULT_PURGE_THRESHOLD,
        }
    }

    /// Entry count above which writes sweep expired entries.
    #[must_use]
    pub const fn with_purge_threshold(mut self, threshold: usize) -> Self {
        self.purge_threshold = threshold;
        self
    }

    /// Number of entries held, live or not yet swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the map is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Remaining lifetime of `key`, if it is live and has a TTL.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = (self.time_fn)();
        let entries = self.entries.read().await;
        let entry = entries.get(key).filter(|e| e.is_live(now))?;
        entry.expires_at.and_then(|at| (at - now).to_std().ok())
    }

    fn entry(&self, value: &str, ttl: Duration) -> Entry {
        let now = (self.time_fn)();
        Entry {
            value: value.to_string(),
            expires_at: now.checked_add_signed(clock::to_delta(ttl)),
        }
    }

    fn purge_expired(&self, entries: &mut HashMap<String, Entry>) {
        if entries.len() > self.purge_threshold {
            let now = (self.time_fn)();
            entries.retain(|_, e| e.is_live(now));
        }
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, VerifierError> {
        let now = (self.time_fn)();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), VerifierError> {
        let entry = self.entry(value, ttl);
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), entry);
        self.purge_expired(&mut entries);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, VerifierError> {
        let now = (self.time_fn)();
        let mut entries = self.entries.write().await;

        if entries.get(key).is_some_and(|e| e.is_live(now)) {
            return Ok(false);
        }

        entries.insert(key.to_string(), self.entry(value, ttl));
        self.purge_expired(&mut entries);
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<(), VerifierError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), VerifierError> {
        self.entries
            .write()
            .await
            .retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, VerifierError> {
        let now = (self.time_fn)();
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .is_some_and(|e| e.is_live(now)))
    }
}
