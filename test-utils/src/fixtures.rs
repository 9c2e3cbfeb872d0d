//! Test fixtures.

use crate::clock::ManualClock;
use crate::mocks::FaultyStore;
use session_verifier::{Identity, MemoryStore, Verifier, VerifierConfig};
use std::sync::Arc;
use std::time::Duration;

/// Signing key used by fixtures.
pub const TEST_SIGNING_KEY: &str = "test-secret-key-for-testing-only";

/// Token lifetime used by fixtures.
pub const TOKEN_EXPIRE: Duration = Duration::from_secs(15 * 60);
/// Session lifetime used by fixtures.
pub const AUTH_EXPIRE: Duration = Duration::from_secs(3 * 60 * 60);
/// Grace window used by fixtures.
pub const TEMP_TOKEN_EXPIRE: Duration = Duration::from_secs(30);

/// Config with the fixture key and durations.
#[must_use]
pub fn test_config() -> VerifierConfig {
    VerifierConfig::new(TEST_SIGNING_KEY)
        .with_token_expire_duration(TOKEN_EXPIRE)
        .with_auth_expire_duration(AUTH_EXPIRE)
        .with_temp_token_expire_duration(TEMP_TOKEN_EXPIRE)
}

/// A verifier, its store and the clock both run on.
pub struct TestEnv<I> {
    /// Shared clock
    pub clock: ManualClock,
    /// Store behind the verifier
    pub store: FaultyStore,
    /// Verifier under test
    pub verifier: Arc<Verifier<I>>,
}

impl<I: Identity> TestEnv<I> {
    /// Environment with [`test_config`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Environment with a custom config.
    ///
    /// # Panics
    ///
    /// Panics if `config` is invalid.
    #[must_use]
    pub fn with_config(config: VerifierConfig) -> Self {
        let clock = ManualClock::default();
        let store = FaultyStore::new(MemoryStore::with_time_fn(clock.time_fn()));
        Self::with_store(config, clock, store)
    }

    /// Environment over an existing store, sharing its clock.
    ///
    /// # Panics
    ///
    /// Panics if `config` is invalid.
    #[must_use]
    pub fn with_store(config: VerifierConfig, clock: ManualClock, store: FaultyStore) -> Self {
        let verifier = Verifier::new(config, Arc::new(store.clone()))
            .expect("fixture config is valid")
            .with_time_fn(clock.time_fn());
        Self {
            clock,
            store,
            verifier: Arc::new(verifier),
        }
    }

    /// Move the shared clock forward.
    pub fn advance(&self, duration: Duration) {
        self.clock.advance(duration);
    }
}

impl<I: Identity> Default for TestEnv<I> {
    fn default() -> Self {
        Self::new()
    }
}
