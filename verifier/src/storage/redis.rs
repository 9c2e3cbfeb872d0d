//! Redis-backed [`TokenStore`].
//!
//! Keys and TTLs map one to one onto Redis keys with `PX` expiry. Prefix
//! deletion walks the keyspace with `SCAN` in batches and deletes each batch.

use super::TokenStore;
use crate::error::VerifierError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

const SCAN_BATCH: usize = 100;

/// Token store backed by Redis.
///
/// `ConnectionManager` reconnects on its own and is cheap to clone, so each
/// command runs on its own handle instead of serializing behind a lock.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to the server at `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns a store error if the URL is invalid or the server unreachable.
    pub async fn new(redis_url: &str) -> Result<Self, VerifierError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(RedisStore { conn })
    }
}

/// Redis rejects a zero expiry; anything under a millisecond rounds up.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Escape glob metacharacters so the prefix matches literally.
fn scan_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

#[async_trait]
impl TokenStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, VerifierError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), VerifierError> {
        let mut conn = self.conn.clone();
        conn.pset_ex::<_, _, ()>(key, value, ttl_millis(ttl)).await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, VerifierError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), VerifierError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), VerifierError> {
        let mut conn = self.conn.clone();
        let pattern = scan_pattern(prefix);
        let mut cursor: u64 = 0;
        let mut deleted = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                deleted += keys.len();
                conn.del::<_, ()>(&keys).await?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(prefix = %prefix, deleted, "Deleted keys by prefix");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, VerifierError> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }
}
