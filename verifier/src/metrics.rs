//! Prometheus metrics for the session verifier.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, CounterVec};

/// Tokens issued counter, by `kind` (create, refresh).
pub static TOKENS_ISSUED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_verifier_tokens_issued_total",
        "Total number of session tokens issued",
        &["kind"]
    )
    .expect("Failed to register tokens_issued metric")
});

/// Verification outcomes counter.
pub static VERIFICATIONS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_verifier_verifications_total",
        "Total number of token verifications",
        &["outcome"]
    )
    .expect("Failed to register verifications metric")
});

/// Destroyed sessions counter, by `scope` (session, identity).
pub static SESSIONS_DESTROYED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_verifier_sessions_destroyed_total",
        "Total number of session destroy operations",
        &["scope"]
    )
    .expect("Failed to register sessions_destroyed metric")
});

/// Store faults counter.
pub static STORE_ERRORS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "session_verifier_store_errors_total",
        "Total number of token store errors",
        &["operation"]
    )
    .expect("Failed to register store_errors metric")
});

/// Verification outcome labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Presented token is the canonical one
    Authorized,
    /// Presented token was expired and this call refreshed it
    Refreshed,
    /// Superseded token accepted inside its grace window
    Grace,
    /// Rejected
    Unauthorized,
}

impl Outcome {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authorized => "authorized",
            Self::Refreshed => "refreshed",
            Self::Grace => "grace",
            Self::Unauthorized => "unauthorized",
        }
    }
}

/// Record a token issuance.
pub fn record_token_issued(kind: &str) {
    TOKENS_ISSUED.with_label_values(&[kind]).inc();
}

/// Record a verification outcome.
pub fn record_verification(outcome: Outcome) {
    VERIFICATIONS.with_label_values(&[outcome.as_str()]).inc();
}

/// Record a destroy operation.
pub fn record_session_destroyed(scope: &str) {
    SESSIONS_DESTROYED.with_label_values(&[scope]).inc();
}

/// Record a store fault.
pub fn record_store_error(operation: &str) {
    STORE_ERRORS.with_label_values(&[operation]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_token_issued() {
        record_token_issued("create");
        let value = TOKENS_ISSUED.with_label_values(&["create"]).get();
        assert!(value > 0.0);
    }

    #[test]
    fn test_record_verification() {
        record_verification(Outcome::Grace);
        let value = VERIFICATIONS.with_label_values(&["grace"]).get();
        assert!(value > 0.0);
    }

    #[test]
    fn test_record_store_error() {
        record_store_error("get");
        let value = STORE_ERRORS.with_label_values(&["get"]).get();
        assert!(value > 0.0);
    }
}
