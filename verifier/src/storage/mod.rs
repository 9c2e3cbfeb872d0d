//! Key-value storage backing session records and grace markers.
//!
//! The verifier holds no mutable state of its own: every coordination
//! decision is made against a [`TokenStore`].

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use crate::error::VerifierError;
use async_trait::async_trait;
use std::time::Duration;

/// TTL-bearing key-value store with an atomic create-only write.
///
/// # Implementation Notes
///
/// - `get` returns `Ok(None)` for a missing or expired key; the verifier
///   reads that as "session absent", not as a fault
/// - `set_if_absent` MUST be atomic across every caller sharing the store.
///   It is the only mutual-exclusion primitive the refresh race relies on
/// - after `delete_by_prefix` returns, no key under the prefix may be
///   readable
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, VerifierError>;

    /// Unconditional upsert; resets the TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), VerifierError>;

    /// Create `key` only if absent. Returns true iff this call created it.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, VerifierError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), VerifierError>;

    /// Remove every key starting with `prefix`.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), VerifierError>;

    /// Whether `key` currently holds a live value.
    async fn exists(&self, key: &str) -> Result<bool, VerifierError>;
}
