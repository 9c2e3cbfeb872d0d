//! HS256 signing and classification of session tokens.
//!
//! Expiry is judged against the caller's clock rather than the library's, so
//! an expired token still decodes with its claims and can be refreshed.

use crate::claims::{Claims, Identity};
use crate::error::VerifierError;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};

/// How a presented token fared against signature and expiry checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Signature ok, not expired
    Valid,
    /// Signature ok, `exp` has passed
    Expired,
    /// Malformed, bad signature, wrong algorithm, missing `exp`
    Rejected,
}

/// Result of decoding a token string.
///
/// `claims` is populated whenever the payload could be read, including for
/// `Expired` and (unverified) for `Rejected` tokens. Only `Valid` and
/// `Expired` claims are backed by a good signature.
#[derive(Debug, Clone)]
pub struct Parsed<I> {
    /// Claims read from the payload, if any
    pub claims: Option<Claims<I>>,
    /// Signature and expiry verdict
    pub outcome: ParseOutcome,
}

impl<I> Parsed<I> {
    fn rejected(claims: Option<Claims<I>>) -> Self {
        Parsed {
            claims,
            outcome: ParseOutcome::Rejected,
        }
    }
}

/// HS256 signer/parser for session claims.
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    /// Codec signing and verifying with `secret`.
    pub fn new(secret: &SecretString) -> Self {
        let secret = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        JwtCodec {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign `claims` into a compact token.
    ///
    /// # Errors
    ///
    /// Returns [`VerifierError::JwtEncoding`] if the claims cannot be serialized.
    pub fn encode<I: Identity>(&self, claims: &Claims<I>) -> Result<String, VerifierError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    /// Decode and classify a token at time `now`. Never fails; garbage input
    /// comes back as `Rejected` with no claims.
    pub fn decode<I: Identity>(&self, token: &str, now: DateTime<Utc>) -> Parsed<I> {
        match decode::<Claims<I>>(token, &self.decoding_key, &self.validation) {
            Ok(data) => {
                let outcome = if data.claims.is_expired_at(now) {
                    ParseOutcome::Expired
                } else {
                    ParseOutcome::Valid
                };
                Parsed {
                    claims: Some(data.claims),
                    outcome,
                }
            }
            Err(_) => Parsed::rejected(Self::decode_unverified(token)),
        }
    }

    /// Read the payload segment without checking the signature.
    fn decode_unverified<I: Identity>(token: &str) -> Option<Claims<I>> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        let payload = base64::Engine::decode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            parts[1],
        )
        .ok()?;

        serde_json::from_slice(&payload).ok()
    }
}
