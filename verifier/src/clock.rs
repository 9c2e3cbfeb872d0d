//! Injectable time source.

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Shared clock function. Defaults to [`Utc::now`]; tests swap in a manual clock.
pub type TimeFn = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The wall clock.
#[must_use]
pub fn system_time() -> TimeFn {
    Arc::new(Utc::now)
}

/// Convert a std duration into a chrono delta, saturating at the largest
/// representable value.
#[must_use]
pub(crate) fn to_delta(duration: std::time::Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
