//! Session verifier library.
//!
//! Issues signed session tokens, validates them against a key-value store,
//! refreshes them transparently when they expire inside a live session, and
//! destroys sessions one at a time or per identity.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod claims;
pub mod clock;
pub mod config;
pub mod default;
pub mod error;
pub mod jwt;
pub mod metrics;
pub mod password;
pub mod storage;
pub mod tracing_config;
pub mod verifier;

// Re-exports for convenience
pub use claims::{Claims, CustomData, Identity};
pub use clock::TimeFn;
pub use config::VerifierConfig;
pub use error::VerifierError;
pub use storage::{MemoryStore, RedisStore, TokenStore};
pub use verifier::{Verified, Verifier};
