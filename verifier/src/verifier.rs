//! Session token verifier.
//!
//! Tokens are short-lived (`token_expire_duration`); the session behind them
//! lives in the store for `auth_expire_duration` after the last refresh.
//!
//! Issuing a token signs claims for `(identity, session id)` and records the
//! token under the session key with the session TTL.
//!
//! Verifying a token requires the session key to exist. Then:
//!
//! 1. signature ok, not expired: authorized iff the stored token is this one
//! 2. signature ok, expired:
//!    - stored token is this one: refresh. The caller that wins
//!      `set_if_absent` on the old token string mints the new token; every
//!      other caller is authorized without one
//!    - stored token differs: authorized only while the old token's grace
//!      marker is alive
//! 3. anything else: unauthorized
//!
//! The grace marker is keyed by the token string itself, so only holders of
//! that exact token benefit from it, and it expires after
//! `temp_token_expire_duration` independent of the session's own TTL.

use crate::claims::{Claims, CustomData, Identity};
use crate::clock::{self, TimeFn};
use crate::config::VerifierConfig;
use crate::error::VerifierError;
use crate::jwt::{JwtCodec, ParseOutcome};
use crate::metrics::{self, Outcome};
use crate::storage::TokenStore;
use chrono::{DateTime, Utc};
use std::marker::PhantomData;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, info, instrument, warn};

/// Value stored under a grace key.
const GRACE_MARKER: &str = "1";

/// Successful verification.
#[derive(Debug, Clone, PartialEq)]
pub struct Verified<I> {
    /// Claims of the presented token
    pub claims: Claims<I>,
    /// Replacement token, present only when this call performed the refresh
    pub new_token: Option<String>,
}

impl<I> Verified<I> {
    const fn current(claims: Claims<I>) -> Self {
        Self {
            claims,
            new_token: None,
        }
    }

    const fn refreshed(claims: Claims<I>, new_token: String) -> Self {
        Self {
            claims,
            new_token: Some(new_token),
        }
    }

    /// Whether this call refreshed the token.
    pub const fn is_refreshed(&self) -> bool {
        self.new_token.is_some()
    }
}

/// Issues, validates, refreshes and destroys session tokens for one
/// identity type.
///
/// Holds no per-call state; share one instance across tasks.
pub struct Verifier<I> {
    config: VerifierConfig,
    codec: JwtCodec,
    store: Arc<dyn TokenStore>,
    time_fn: TimeFn,
    _identity: PhantomData<fn() -> I>,
}

impl<I: Identity> Verifier<I> {
    /// Verifier over `store`, keyed and timed by `config`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails
    /// [`VerifierConfig::validate`].
    pub fn new(config: VerifierConfig, store: Arc<dyn TokenStore>) -> Result<Self, VerifierError> {
        config.validate()?;

        let codec = JwtCodec::new(&config.signing_key);
        Ok(Self {
            config,
            codec,
            store,
            time_fn: clock::system_time(),
            _identity: PhantomData,
        })
    }

    /// Replace the clock used for token expiry.
    #[must_use]
    pub fn with_time_fn(mut self, time_fn: TimeFn) -> Self {
        self.time_fn = time_fn;
        self
    }

    /// The configuration this verifier was built with.
    pub const fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Verify a token, refreshing it when due.
    ///
    /// # Errors
    ///
    /// [`VerifierError::Unauthorized`] for every rejection, whatever the
    /// cause.
    #[instrument(skip_all, fields(source = %self.config.source_name))]
    pub async fn verify_token(&self, token: &str) -> Result<Verified<I>, VerifierError> {
        self.verify(token, true).await
    }

    /// Validate a token without side effects. Returns its claims when
    /// authorized.
    #[instrument(skip_all, fields(source = %self.config.source_name))]
    pub async fn is_token_authorized(&self, token: &str) -> Option<Claims<I>> {
        self.verify(token, false).await.ok().map(|v| v.claims)
    }

    /// Start a new session for `identity`.
    ///
    /// # Errors
    ///
    /// Signing and store faults are returned as-is.
    #[instrument(skip(self, data), fields(source = %self.config.source_name, identity = %identity))]
    pub async fn create_token(&self, identity: &I, data: CustomData) -> Result<String, VerifierError> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let token = self.issue(identity, &session_id, data).await?;

        metrics::record_token_issued("create");
        info!(session_id = %session_id, "Created session");
        Ok(token)
    }

    /// Issue a new token for an existing session, resetting its idle timer.
    ///
    /// # Errors
    ///
    /// Signing and store faults are returned as-is.
    #[instrument(skip(self, data), fields(source = %self.config.source_name, identity = %identity))]
    pub async fn refresh_token(
        &self,
        identity: &I,
        session_id: &str,
        data: CustomData,
    ) -> Result<String, VerifierError> {
        let token = self.issue(identity, session_id, data).await?;

        metrics::record_token_issued("refresh");
        debug!(session_id = %session_id, "Refreshed session token");
        Ok(token)
    }

    /// End one session.
    ///
    /// # Errors
    ///
    /// Store faults are returned as-is.
    #[instrument(skip(self), fields(source = %self.config.source_name, identity = %identity))]
    pub async fn destroy_token(&self, identity: &I, session_id: &str) -> Result<(), VerifierError> {
        self.store
            .delete(&self.session_key(identity, session_id))
            .await
            .inspect_err(|_| metrics::record_store_error("delete"))?;

        metrics::record_session_destroyed("session");
        info!(session_id = %session_id, "Destroyed session");
        Ok(())
    }

    /// End every session of `identity`.
    ///
    /// # Errors
    ///
    /// Store faults are returned as-is.
    #[instrument(skip(self), fields(source = %self.config.source_name, identity = %identity))]
    pub async fn destroy_all_tokens(&self, identity: &I) -> Result<(), VerifierError> {
        self.store
            .delete_by_prefix(&self.session_key_prefix(identity))
            .await
            .inspect_err(|_| metrics::record_store_error("delete_by_prefix"))?;

        metrics::record_session_destroyed("identity");
        info!("Destroyed all sessions");
        Ok(())
    }

    /// Store key holding the canonical token of a session.
    pub fn session_key(&self, identity: &I, session_id: &str) -> String {
        format!("{}{}", self.session_key_prefix(identity), session_id)
    }

    /// Prefix shared by every session key of `identity`.
    pub fn session_key_prefix(&self, identity: &I) -> String {
        format!(
            "verifier:{}:{}:uid:",
            self.config.source_name,
            identity.key_fragment()
        )
    }

    fn now(&self) -> DateTime<Utc> {
        (self.time_fn)()
    }

    async fn issue(&self, identity: &I, session_id: &str, data: CustomData) -> Result<String, VerifierError> {
        if !identity.is_present() || session_id.is_empty() {
            return Err(VerifierError::invalid_input(
                "identity and session id must be present",
            ));
        }

        let expires_at = self
            .now()
            .checked_add_signed(clock::to_delta(self.config.token_expire_duration))
            .ok_or_else(|| VerifierError::config("token expiry out of range"))?;
        let claims = Claims::new(identity.clone(), session_id, expires_at, data);
        let token = self.codec.encode(&claims)?;

        self.store
            .set(
                &self.session_key(identity, session_id),
                &token,
                self.config.auth_expire_duration,
            )
            .await
            .inspect_err(|_| metrics::record_store_error("set"))?;

        Ok(token)
    }

    async fn verify(&self, token: &str, allow_refresh: bool) -> Result<Verified<I>, VerifierError> {
        if let Some((verified, outcome)) = self.evaluate(token, allow_refresh).await {
            metrics::record_verification(outcome);
            debug!(outcome = outcome.as_str(), session_id = %verified.claims.session_id, "Token verified");
            Ok(verified)
        } else {
            metrics::record_verification(Outcome::Unauthorized);
            debug!("Token rejected");
            Err(VerifierError::Unauthorized)
        }
    }

    /// Run the validation state machine. `None` means unauthorized.
    async fn evaluate(&self, token: &str, allow_refresh: bool) -> Option<(Verified<I>, Outcome)> {
        let parsed = self.codec.decode::<I>(token, self.now());

        // Garbage input decodes to no claims and stops here
        let claims = parsed.claims.filter(Claims::is_structurally_valid)?;
        let identity = claims.identity()?.clone();

        // The store is consulted even for forged claims
        let stored = match self.store.get(&self.session_key(&identity, &claims.session_id)).await {
            Ok(stored) => stored?,
            Err(e) => {
                self.store_fault("get", &e);
                return None;
            }
        };
        let is_canonical = same_token(&stored, token);

        match (parsed.outcome, is_canonical) {
            (ParseOutcome::Valid, true) => Some((Verified::current(claims), Outcome::Authorized)),
            (ParseOutcome::Expired, true) => {
                if allow_refresh && self.claim_refresh(token).await {
                    match self
                        .refresh_token(&identity, &claims.session_id, claims.data.clone())
                        .await
                    {
                        Ok(new_token) => Some((Verified::refreshed(claims, new_token), Outcome::Refreshed)),
                        Err(e) => {
                            warn!(error = %e, session_id = %claims.session_id, "Token refresh failed");
                            None
                        }
                    }
                } else {
                    // Another request is refreshing; the session is still alive
                    Some((Verified::current(claims), Outcome::Authorized))
                }
            }
            (ParseOutcome::Expired, false) => self
                .in_grace(token)
                .await?
                .then(|| (Verified::current(claims), Outcome::Grace)),
            // A live token that is no longer canonical was superseded explicitly
            (ParseOutcome::Valid, false) | (ParseOutcome::Rejected, _) => None,
        }
    }

    /// Try to become the refresher of `token`.
    ///
    /// A store fault counts as a lost race: the session was just read back
    /// as live, so the caller stays authorized without a new token.
    async fn claim_refresh(&self, token: &str) -> bool {
        match self
            .store
            .set_if_absent(token, GRACE_MARKER, self.config.temp_token_expire_duration)
            .await
        {
            Ok(won) => won,
            Err(e) => {
                self.store_fault("set_if_absent", &e);
                false
            }
        }
    }

    /// Whether the superseded `token` is inside its grace window. `None` on
    /// store fault.
    async fn in_grace(&self, token: &str) -> Option<bool> {
        match self.store.exists(token).await {
            Ok(exists) => Some(exists),
            Err(e) => {
                self.store_fault("exists", &e);
                None
            }
        }
    }

    fn store_fault(&self, operation: &str, err: &VerifierError) {
        metrics::record_store_error(operation);
        warn!(
            operation,
            source = %self.config.source_name,
            error = %err,
            "Token store fault during verification"
        );
    }
}

fn same_token(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::sync::Mutex;
    use std::time::Duration;

    struct Harness {
        now: Arc<Mutex<DateTime<Utc>>>,
        store: MemoryStore,
        verifier: Verifier<u64>,
    }

    impl Harness {
        fn new() -> Self {
            let now = Arc::new(Mutex::new(Utc::now()));
            let handle = Arc::clone(&now);
            let time_fn: TimeFn = Arc::new(move || *handle.lock().unwrap());

            let store = MemoryStore::with_time_fn(Arc::clone(&time_fn));
            let config = VerifierConfig::new("test-secret-key-for-testing-only");
            let verifier = Verifier::new(config, Arc::new(store.clone()))
                .unwrap()
                .with_time_fn(time_fn);

            Self { now, store, verifier }
        }

        fn advance(&self, duration: Duration) {
            *self.now.lock().unwrap() += chrono::Duration::from_std(duration).unwrap();
        }
    }

    #[test]
    fn test_session_key_layout() {
        let h = Harness::new();
        assert_eq!(h.verifier.session_key(&42, "abc"), "verifier:user:42:uid:abc");
        assert_eq!(h.verifier.session_key_prefix(&42), "verifier:user:42:uid:");
    }

    #[tokio::test]
    async fn test_fresh_token_is_authorized() {
        let h = Harness::new();
        let token = h.verifier.create_token(&42, CustomData::new()).await.unwrap();

        let verified = h.verifier.verify_token(&token).await.unwrap();
        assert_eq!(verified.claims.identity(), Some(&42));
        assert!(verified.new_token.is_none());

        let key = h.verifier.session_key(&42, &verified.claims.session_id);
        assert_eq!(h.store.get(&key).await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_once() {
        let h = Harness::new();
        let token = h.verifier.create_token(&42, CustomData::new()).await.unwrap();
        h.advance(Duration::from_secs(16 * 60));

        let first = h.verifier.verify_token(&token).await.unwrap();
        let new_token = first.new_token.clone().unwrap();
        assert_ne!(new_token, token);

        // Still inside the grace window: accepted, no second refresh
        let second = h.verifier.verify_token(&token).await.unwrap();
        assert!(second.new_token.is_none());

        let key = h.verifier.session_key(&42, &first.claims.session_id);
        assert_eq!(h.store.get(&key).await.unwrap(), Some(new_token));
    }

    #[tokio::test]
    async fn test_authorize_only_never_refreshes() {
        let h = Harness::new();
        let token = h.verifier.create_token(&42, CustomData::new()).await.unwrap();
        h.advance(Duration::from_secs(16 * 60));

        assert!(h.verifier.is_token_authorized(&token).await.is_some());
        assert!(!h.store.exists(&token).await.unwrap());

        // A later verify still gets to refresh
        let verified = h.verifier.verify_token(&token).await.unwrap();
        assert!(verified.is_refreshed());
    }

    #[tokio::test]
    async fn test_superseded_live_token_is_rejected() {
        let h = Harness::new();
        let token = h.verifier.create_token(&42, CustomData::new()).await.unwrap();
        let claims = h.verifier.is_token_authorized(&token).await.unwrap();

        // Manual refresh one second later supersedes a still-valid token
        h.advance(Duration::from_secs(1));
        let replacement = h
            .verifier
            .refresh_token(&42, &claims.session_id, CustomData::new())
            .await
            .unwrap();

        assert!(h.verifier.verify_token(&token).await.unwrap_err().is_unauthorized());
        assert!(h.verifier.verify_token(&replacement).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_identity_cannot_be_issued() {
        let h = Harness::new();
        let err = h.verifier.create_token(&0, CustomData::new()).await.unwrap_err();
        assert!(matches!(err, VerifierError::InvalidInput(_)));
        assert!(h.store.is_empty().await);
    }

    #[test]
    fn test_invalid_config_is_refused() {
        let config = VerifierConfig::new("secret").with_token_expire_duration(Duration::ZERO);

        let result = Verifier::<u64>::new(config, Arc::new(MemoryStore::new()));

        assert!(matches!(result, Err(VerifierError::Config(_))));
    }

    #[tokio::test]
    async fn test_identity_with_key_separator_cannot_be_issued() {
        let h = Harness::new();
        let strings = Verifier::<String>::new(
            VerifierConfig::new("test-secret-key-for-testing-only"),
            Arc::new(h.store.clone()),
        )
        .unwrap();
        let err = strings
            .create_token(&"alice:uid:x".to_string(), CustomData::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VerifierError::InvalidInput(_)));
        assert!(strings
            .refresh_token(&"alice:uid:x".to_string(), "session", CustomData::new())
            .await
            .is_err());
        assert!(h.store.is_empty().await);
    }

    #[test]
    fn test_same_token() {
        assert!(same_token("abc", "abc"));
        assert!(!same_token("abc", "abd"));
        assert!(!same_token("abc", "abcd"));
    }
}
