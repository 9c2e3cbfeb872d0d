//! Verifier configuration.
//!
//! Assembled once at construction and immutable afterwards. Can be built in
//! code with the `with_*` methods or loaded from environment variables.

use crate::error::VerifierError;
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::time::Duration;

/// Default key namespace discriminator.
pub const DEFAULT_SOURCE_NAME: &str = "user";
/// Default token freshness window.
pub const DEFAULT_TOKEN_EXPIRE: Duration = Duration::from_secs(15 * 60);
/// Default session idle lifetime.
pub const DEFAULT_AUTH_EXPIRE: Duration = Duration::from_secs(3 * 60 * 60);
/// Default grace window for superseded tokens.
pub const DEFAULT_TEMP_TOKEN_EXPIRE: Duration = Duration::from_secs(30);

/// Session verifier configuration.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// HMAC signing key
    pub signing_key: SecretString,
    /// Namespace for store keys (`user`, `admin`, `account`...)
    pub source_name: String,
    /// Lifetime of a single token before it must be refreshed
    pub token_expire_duration: Duration,
    /// Session idle lifetime; reset on every refresh
    pub auth_expire_duration: Duration,
    /// How long a superseded token stays acceptable
    pub temp_token_expire_duration: Duration,
}

impl VerifierConfig {
    /// Create config with the given signing key and default durations.
    #[must_use]
    pub fn new(signing_key: impl Into<String>) -> Self {
        Self {
            signing_key: SecretString::from(signing_key.into()),
            source_name: DEFAULT_SOURCE_NAME.to_string(),
            token_expire_duration: DEFAULT_TOKEN_EXPIRE,
            auth_expire_duration: DEFAULT_AUTH_EXPIRE,
            temp_token_expire_duration: DEFAULT_TEMP_TOKEN_EXPIRE,
        }
    }

    /// Create config with custom source name.
    #[must_use]
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self
    }

    /// Create config with custom token lifetime.
    #[must_use]
    pub const fn with_token_expire_duration(mut self, duration: Duration) -> Self {
        self.token_expire_duration = duration;
        self
    }

    /// Create config with custom session idle lifetime.
    #[must_use]
    pub const fn with_auth_expire_duration(mut self, duration: Duration) -> Self {
        self.auth_expire_duration = duration;
        self
    }

    /// Create config with custom grace window.
    #[must_use]
    pub const fn with_temp_token_expire_duration(mut self, duration: Duration) -> Self {
        self.temp_token_expire_duration = duration;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Reads a `.env` file first if present. `VERIFIER_SIGNING_KEY` is
    /// required; durations are given in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, VerifierError> {
        dotenvy::dotenv().ok();

        let signing_key = env::var("VERIFIER_SIGNING_KEY")
            .map_err(|_| VerifierError::config("VERIFIER_SIGNING_KEY is not set"))?;
        let source_name =
            env::var("VERIFIER_SOURCE_NAME").unwrap_or_else(|_| DEFAULT_SOURCE_NAME.to_string());

        let config = Self::new(signing_key)
            .with_source_name(source_name)
            .with_token_expire_duration(Duration::from_secs(parse_env(
                "VERIFIER_TOKEN_EXPIRE_SECS",
                DEFAULT_TOKEN_EXPIRE.as_secs(),
            )?))
            .with_auth_expire_duration(Duration::from_secs(parse_env(
                "VERIFIER_AUTH_EXPIRE_SECS",
                DEFAULT_AUTH_EXPIRE.as_secs(),
            )?))
            .with_temp_token_expire_duration(Duration::from_secs(parse_env(
                "VERIFIER_TEMP_TOKEN_EXPIRE_SECS",
                DEFAULT_TEMP_TOKEN_EXPIRE.as_secs(),
            )?));

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the verifier cannot work with.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty key or source name, a zero duration, or
    /// a token lifetime that is not shorter than the session lifetime.
    pub fn validate(&self) -> Result<(), VerifierError> {
        if self.signing_key.expose_secret().is_empty() {
            return Err(VerifierError::config("signing key must not be empty"));
        }
        if self.source_name.is_empty() {
            return Err(VerifierError::config("source name must not be empty"));
        }
        if self.token_expire_duration.is_zero()
            || self.auth_expire_duration.is_zero()
            || self.temp_token_expire_duration.is_zero()
        {
            return Err(VerifierError::config("durations must be non-zero"));
        }
        if self.token_expire_duration >= self.auth_expire_duration {
            return Err(VerifierError::config(format!(
                "token lifetime ({:?}) must be shorter than session lifetime ({:?})",
                self.token_expire_duration, self.auth_expire_duration
            )));
        }
        Ok(())
    }
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, VerifierError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| VerifierError::config(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VerifierConfig::new("secret");

        assert_eq!(config.source_name, "user");
        assert_eq!(config.token_expire_duration, Duration::from_secs(900));
        assert_eq!(config.auth_expire_duration, Duration::from_secs(10_800));
        assert_eq!(config.temp_token_expire_duration, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = VerifierConfig::new("secret")
            .with_source_name("admin")
            .with_token_expire_duration(Duration::from_secs(600))
            .with_auth_expire_duration(Duration::from_secs(7200))
            .with_temp_token_expire_duration(Duration::from_secs(60));

        assert_eq!(config.source_name, "admin");
        assert_eq!(config.token_expire_duration, Duration::from_secs(600));
        assert_eq!(config.auth_expire_duration, Duration::from_secs(7200));
        assert_eq!(config.temp_token_expire_duration, Duration::from_secs(60));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(VerifierConfig::new("").validate().is_err());
        assert!(VerifierConfig::new("k").with_source_name("").validate().is_err());
        assert!(VerifierConfig::new("k")
            .with_temp_token_expire_duration(Duration::ZERO)
            .validate()
            .is_err());
        assert!(VerifierConfig::new("k")
            .with_token_expire_duration(Duration::from_secs(3600))
            .with_auth_expire_duration(Duration::from_secs(3600))
            .validate()
            .is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = VerifierConfig::new("super-secret-value");
        assert!(!format!("{config:?}").contains("super-secret-value"));
    }

    #[test]
    fn test_parse_env_default() {
        let value: u64 = parse_env("VERIFIER_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }
}
