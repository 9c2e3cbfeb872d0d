//! Shared proptest generators.

use proptest::prelude::*;
use session_verifier::CustomData;
use std::time::Duration;

/// Non-zero numeric identities.
pub fn numeric_identity_strategy() -> impl Strategy<Value = u64> {
    1u64..=u64::MAX
}

/// Non-empty string identities, including characters that are special in
/// Redis glob patterns and the `:` store key separator.
pub fn string_identity_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_@.*?:-]{1,32}"
}

/// Custom payloads of mixed JSON value types.
pub fn custom_data_strategy() -> impl Strategy<Value = CustomData> {
    let value = prop_oneof![
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        "[a-zA-Z0-9 ]{0,24}".prop_map(serde_json::Value::from),
        prop::collection::vec(any::<u16>(), 0..4).prop_map(serde_json::Value::from),
    ];
    prop::collection::hash_map("[a-z_]{1,12}", value, 0..6)
}

/// Strings that are not tokens issued by any verifier.
pub fn junk_token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-zA-Z0-9]{1,64}",
        "[a-zA-Z0-9_-]{1,40}\\.[a-zA-Z0-9_-]{1,40}\\.[a-zA-Z0-9_-]{1,40}",
        ".{0,128}",
    ]
}

/// Small durations in whole seconds.
pub fn duration_secs_strategy(max_secs: u64) -> impl Strategy<Value = Duration> {
    (1..=max_secs).prop_map(Duration::from_secs)
}
