//! Tracing subscriber setup for binaries embedding the verifier.
//!
//! Verifier events are emitted under the `session_verifier` target. The
//! default filter keeps them at `info` and everything else at `warn`;
//! `VERIFIER_LOG` replaces the filter entirely.

use crate::error::VerifierError;
use std::env;
use tracing::{info_span, Level, Span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding filter directives.
pub const LOG_FILTER_ENV: &str = "VERIFIER_LOG";
/// Environment variable selecting the output format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "VERIFIER_LOG_FORMAT";

const VERIFIER_TARGET: &str = "session_verifier";

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// `EnvFilter` directives used when `VERIFIER_LOG` is unset
    pub directives: String,
    /// Emit one JSON object per event
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            directives: String::new(),
            json_output: false,
        }
        .with_verifier_level(Level::INFO)
    }
}

impl TracingConfig {
    /// Settings from `VERIFIER_LOG_FORMAT`; the filter itself is read at
    /// [`init_tracing`] time.
    #[must_use]
    pub fn from_env() -> Self {
        let json_output = env::var(LOG_FORMAT_ENV).is_ok_and(|format| format.eq_ignore_ascii_case("json"));
        Self {
            json_output,
            ..Self::default()
        }
    }

    /// Log verifier events at `level`, everything else at `warn`.
    #[must_use]
    pub fn with_verifier_level(mut self, level: Level) -> Self {
        self.directives = format!("warn,{VERIFIER_TARGET}={level}");
        self
    }

    /// Enable JSON output.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, VerifierError> {
        match env::var(LOG_FILTER_ENV) {
            Ok(directives) => EnvFilter::try_new(&directives),
            Err(_) => EnvFilter::try_new(&self.directives),
        }
        .map_err(|e| VerifierError::config(format!("invalid log filter: {e}")))
    }
}

/// Install the global subscriber. Call once at startup.
///
/// # Errors
///
/// Returns a configuration error for unparsable filter directives or when a
/// global subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), VerifierError> {
    let filter = config.env_filter()?;

    let installed = if config.json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    installed.map_err(|e| VerifierError::config(format!("tracing already initialized: {e}")))
}

/// Root span for work done on behalf of one verifier namespace.
#[must_use]
pub fn root_span(source_name: &str) -> Span {
    info_span!(target: VERIFIER_TARGET, "session_verifier", source = %source_name)
}
