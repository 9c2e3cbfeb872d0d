//! Redis store tests. Require a running server at `REDIS_URL`:
//!
//! ```text
//! REDIS_URL=redis://127.0.0.1:6379 cargo test --test redis_store_tests -- --ignored
//! ```

use session_verifier::{CustomData, RedisStore, TokenStore, Verifier};
use std::sync::Arc;
use std::time::Duration;
use test_utils::fixtures::test_config;

async fn connect() -> RedisStore {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    RedisStore::new(&url).await.expect("redis reachable at REDIS_URL")
}

fn unique(prefix: &str) -> String {
    format!("test:{prefix}:{}", uuid::Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires Redis at REDIS_URL"]
async fn test_get_set_delete() {
    let store = connect().await;
    let key = unique("kv");

    assert_eq!(store.get(&key).await.unwrap(), None);
    store.set(&key, "value", Duration::from_secs(30)).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("value"));
    assert!(store.exists(&key).await.unwrap());

    store.delete(&key).await.unwrap();
    assert!(!store.exists(&key).await.unwrap());
    // Deleting a missing key is not an error
    store.delete(&key).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Redis at REDIS_URL"]
async fn test_set_if_absent_only_once() {
    let store = connect().await;
    let key = unique("nx");

    assert!(store.set_if_absent(&key, "1", Duration::from_secs(30)).await.unwrap());
    assert!(!store.set_if_absent(&key, "2", Duration::from_secs(30)).await.unwrap());
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("1"));

    store.delete(&key).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Redis at REDIS_URL"]
async fn test_ttl_expiry() {
    let store = connect().await;
    let key = unique("ttl");

    store.set(&key, "value", Duration::from_millis(200)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(store.get(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires Redis at REDIS_URL"]
async fn test_delete_by_prefix_is_literal() {
    let store = connect().await;
    let base = unique("scan");
    let ttl = Duration::from_secs(30);

    // More keys than one SCAN batch
    for i in 0..250 {
        store.set(&format!("{base}:a*:{i}"), "v", ttl).await.unwrap();
    }
    store.set(&format!("{base}:ab:0"), "v", ttl).await.unwrap();

    store.delete_by_prefix(&format!("{base}:a*:")).await.unwrap();

    assert!(!store.exists(&format!("{base}:a*:0")).await.unwrap());
    assert!(!store.exists(&format!("{base}:a*:249")).await.unwrap());
    assert!(store.exists(&format!("{base}:ab:0")).await.unwrap());

    store.delete_by_prefix(&base).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Redis at REDIS_URL"]
async fn test_verifier_over_redis() {
    let store = Arc::new(connect().await);
    let source = unique("source").replace(':', "-");
    let verifier = Verifier::<u64>::new(test_config().with_source_name(source), store).unwrap();

    let token = verifier.create_token(&42, CustomData::new()).await.unwrap();
    let verified = verifier.verify_token(&token).await.unwrap();
    assert!(!verified.is_refreshed());

    verifier.destroy_all_tokens(&42).await.unwrap();
    assert!(verifier.verify_token(&token).await.is_err());
}
