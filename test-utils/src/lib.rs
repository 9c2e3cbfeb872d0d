//! Shared test utilities for session-verifier.
//!
//! This crate provides:
//! - A manually advanced clock shared by verifier and store
//! - Proptest generators for identities, custom data and junk tokens
//! - Store mocks for fault injection and call recording
//! - Test fixtures wiring it all together

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use clock::ManualClock;
pub use fixtures::TestEnv;
pub use generators::*;
