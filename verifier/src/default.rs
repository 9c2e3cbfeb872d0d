//! Process-wide default verifier.
//!
//! Initialize once at startup with [`init_default_verifier`]; afterwards the
//! free functions in this module forward to it. The default is read-only
//! once installed and cannot be replaced.

use crate::claims::{Claims, CustomData, Identity};
use crate::error::VerifierError;
use crate::verifier::{Verified, Verifier};
use once_cell::sync::OnceCell;
use std::any::Any;

static DEFAULT_VERIFIER: OnceCell<Box<dyn Any + Send + Sync>> = OnceCell::new();

/// Install `verifier` as the process-wide default.
///
/// # Errors
///
/// Returns a configuration error if a default verifier is already installed.
pub fn init_default_verifier<I: Identity>(verifier: Verifier<I>) -> Result<(), VerifierError> {
    DEFAULT_VERIFIER
        .set(Box::new(verifier))
        .map_err(|_| VerifierError::config("default verifier is already initialized"))
}

/// The default verifier, if one was installed for identity type `I`.
pub fn default_verifier<I: Identity>() -> Option<&'static Verifier<I>> {
    DEFAULT_VERIFIER.get()?.downcast_ref::<Verifier<I>>()
}

fn require<I: Identity>() -> Result<&'static Verifier<I>, VerifierError> {
    default_verifier::<I>().ok_or_else(|| {
        VerifierError::config(format!(
            "no default verifier for identity type {}",
            std::any::type_name::<I>()
        ))
    })
}

/// [`Verifier::verify_token`] on the default verifier.
///
/// # Errors
///
/// Configuration error when uninitialized, otherwise as the method.
pub async fn verify_token<I: Identity>(token: &str) -> Result<Verified<I>, VerifierError> {
    require::<I>()?.verify_token(token).await
}

/// [`Verifier::is_token_authorized`] on the default verifier. `None` when
/// uninitialized.
pub async fn is_token_authorized<I: Identity>(token: &str) -> Option<Claims<I>> {
    match default_verifier::<I>() {
        Some(verifier) => verifier.is_token_authorized(token).await,
        None => None,
    }
}

/// [`Verifier::create_token`] on the default verifier.
///
/// # Errors
///
/// Configuration error when uninitialized, otherwise as the method.
pub async fn create_token<I: Identity>(identity: &I, data: CustomData) -> Result<String, VerifierError> {
    require::<I>()?.create_token(identity, data).await
}

/// [`Verifier::refresh_token`] on the default verifier.
///
/// # Errors
///
/// Configuration error when uninitialized, otherwise as the method.
pub async fn refresh_token<I: Identity>(
    identity: &I,
    session_id: &str,
    data: CustomData,
) -> Result<String, VerifierError> {
    require::<I>()?.refresh_token(identity, session_id, data).await
}

/// [`Verifier::destroy_token`] on the default verifier.
///
/// # Errors
///
/// Configuration error when uninitialized, otherwise as the method.
pub async fn destroy_token<I: Identity>(identity: &I, session_id: &str) -> Result<(), VerifierError> {
    require::<I>()?.destroy_token(identity, session_id).await
}

/// [`Verifier::destroy_all_tokens`] on the default verifier.
///
/// # Errors
///
/// Configuration error when uninitialized, otherwise as the method.
pub async fn destroy_all_tokens<I: Identity>(identity: &I) -> Result<(), VerifierError> {
    require::<I>()?.destroy_all_tokens(identity).await
}
