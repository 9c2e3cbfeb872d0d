//! Session token claims.
//!
//! A token carries the identity it was issued for, the session instance it
//! belongs to, its expiry, and an opaque custom payload that is copied
//! verbatim into every refreshed token.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque custom payload round-tripped through every token of a session.
pub type CustomData = HashMap<String, serde_json::Value>;

/// Identity a session is issued for (user id, admin id, account id...).
///
/// The verifier only compares identities and renders them into store keys.
pub trait Identity:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Display + fmt::Debug + Send + Sync + 'static
{
    /// False for the zero value of the type (0, empty string, nil UUID) and
    /// for values that cannot be rendered into a store key unambiguously.
    fn is_present(&self) -> bool;

    /// Fragment used inside store keys.
    fn key_fragment(&self) -> String {
        self.to_string()
    }
}

macro_rules! impl_numeric_identity {
    ($($t:ty),*) => {
        $(
            impl Identity for $t {
                fn is_present(&self) -> bool {
                    *self != 0
                }
            }
        )*
    };
}

impl_numeric_identity!(u32, u64, i32, i64);

/// Store keys use `:` as their separator, so an identity containing one
/// could fall under another identity's key prefix. Such strings are treated
/// as absent.
impl Identity for String {
    fn is_present(&self) -> bool {
        !self.is_empty() && !self.contains(':')
    }
}

impl Identity for uuid::Uuid {
    fn is_present(&self) -> bool {
        !self.is_nil()
    }
}

/// Claims signed into every session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims<I> {
    /// Expiry, seconds since the Unix epoch
    pub exp: i64,

    /// Identity the session belongs to
    #[serde(rename = "SourceID", default = "Option::default")]
    pub source_id: Option<I>,

    /// Session instance, shared by every token of the session
    #[serde(rename = "UUID", default)]
    pub session_id: String,

    /// Custom payload
    #[serde(rename = "Data", default, deserialize_with = "null_as_empty")]
    pub data: CustomData,
}

impl<I: Identity> Claims<I> {
    /// Claims for `identity`'s session `session_id`, expiring at `expires_at`.
    pub fn new(
        identity: I,
        session_id: impl Into<String>,
        expires_at: DateTime<Utc>,
        data: CustomData,
    ) -> Self {
        Claims {
            exp: expires_at.timestamp(),
            source_id: Some(identity),
            session_id: session_id.into(),
            data,
        }
    }

    /// True iff the identity is present and the session id is non-empty.
    ///
    /// Checked before any trust decision; claims failing it are rejected
    /// whatever the signature says.
    pub fn is_structurally_valid(&self) -> bool {
        self.source_id.as_ref().is_some_and(Identity::is_present) && !self.session_id.is_empty()
    }

    /// The identity, if the token carried one.
    pub fn identity(&self) -> Option<&I> {
        self.source_id.as_ref()
    }

    /// A token is valid strictly before its `exp` second.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<CustomData, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<CustomData>::deserialize(deserializer)?.unwrap_or_default())
}
