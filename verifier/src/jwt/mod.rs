//! Session token codec.

pub mod codec;

pub use codec::{JwtCodec, ParseOutcome, Parsed};
