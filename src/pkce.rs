//! PKCE (Proof Key for Code Exchange) per RFC 7636.
//!
//! Binds an authorization code to the client that requested it: the client
//! sends a challenge derived from a secret verifier, then proves possession
//! of the verifier at code exchange. All challenge comparisons are
//! constant-time.

use crate::config::PkceConfig;
use crate::error::AuthError;
use crate::random::{RandomTokenGenerator, PKCE_VERIFIER_MAX_LENGTH, PKCE_VERIFIER_MIN_LENGTH};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Challenge derivation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeChallengeMethod {
    /// Challenge equals the verifier. RFC-permitted but weak; deployments
    /// can refuse it via [`PkceConfig::allow_plain`].
    Plain,
    /// Challenge is the base64url-encoded SHA-256 of the verifier.
    S256,
}

impl CodeChallengeMethod {
    /// Parse a method from its wire name.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnsupportedAlgorithm` for unknown methods.
    pub fn parse(method: &str) -> Result<Self, AuthError> {
        match method {
            "plain" => Ok(Self::Plain),
            "S256" => Ok(Self::S256),
            other => Err(AuthError::unsupported_algorithm(other)),
        }
    }

    /// Get the wire name of the method.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
        }
    }
}

impl Default for CodeChallengeMethod {
    fn default() -> Self {
        Self::S256
    }
}

impl std::fmt::Display for CodeChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome kinds for authorization-request validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequestErrorKind {
    /// PKCE is required but no challenge was supplied.
    PkceRequired,
    /// The supplied challenge method is unsupported or disallowed.
    InvalidMethod,
}

impl AuthRequestErrorKind {
    /// Get the OAuth-style error kind string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PkceRequired => "pkce_required",
            Self::InvalidMethod => "invalid_method",
        }
    }
}

/// Result of validating the PKCE parameters of an authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRequestValidation {
    /// Whether the request may proceed.
    pub valid: bool,
    /// Failure kind when `valid` is false.
    pub error: Option<AuthRequestErrorKind>,
}

impl AuthRequestValidation {
    fn ok() -> Self {
        Self { valid: true, error: None }
    }

    fn fail(kind: AuthRequestErrorKind) -> Self {
        Self { valid: false, error: Some(kind) }
    }
}

/// Validate a verifier's length and alphabet per RFC 7636.
///
/// Out-of-range input is rejected at the boundary, never truncated or
/// padded.
///
/// # Errors
///
/// Returns a validation error for bad length or characters.
pub fn validate_verifier(verifier: &str) -> Result<(), AuthError> {
    let len = verifier.len();
    if !(PKCE_VERIFIER_MIN_LENGTH..=PKCE_VERIFIER_MAX_LENGTH).contains(&len) {
        return Err(AuthError::validation(format!(
            "verifier length must be 43-128, got {}",
            len
        )));
    }
    if !verifier
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '~')
    {
        return Err(AuthError::validation(
            "verifier must use the unreserved alphabet [A-Za-z0-9-._~]",
        ));
    }
    Ok(())
}

/// Generate a random verifier of exactly `length` characters.
///
/// # Errors
///
/// Returns a validation error when `length` is outside [43, 128].
pub fn generate_verifier(length: usize) -> Result<String, AuthError> {
    RandomTokenGenerator::new().pkce_verifier(length)
}

/// Generate a random verifier of the minimum RFC 7636 length, 43
/// characters.
///
/// # Errors
///
/// Returns an error only when the system RNG fails.
pub fn generate_default_verifier() -> Result<String, AuthError> {
    generate_verifier(PKCE_VERIFIER_MIN_LENGTH)
}

/// Derive a challenge from a verifier under the given method.
///
/// # Errors
///
/// Returns a validation error if the verifier fails format validation.
pub fn generate_challenge(
    verifier: &str,
    method: CodeChallengeMethod,
) -> Result<String, AuthError> {
    validate_verifier(verifier)?;
    Ok(match method {
        CodeChallengeMethod::Plain => verifier.to_string(),
        CodeChallengeMethod::S256 => {
            let digest = Sha256::digest(verifier.as_bytes());
            URL_SAFE_NO_PAD.encode(digest)
        }
    })
}

/// Verify a verifier against a previously stored challenge.
///
/// Returns `false` for malformed verifiers and mismatches alike; the
/// comparison is constant-time for both methods.
#[must_use]
pub fn verify(verifier: &str, challenge: &str, method: CodeChallengeMethod) -> bool {
    let Ok(expected) = generate_challenge(verifier, method) else {
        return false;
    };

    let expected_bytes = expected.as_bytes();
    let challenge_bytes = challenge.as_bytes();
    if expected_bytes.len() != challenge_bytes.len() {
        return false;
    }
    expected_bytes.ct_eq(challenge_bytes).into()
}

/// Validate the PKCE parameters of an authorization request.
///
/// A missing method defaults to `plain` per RFC 7636 section 4.3. The
/// `plain` method itself is policy-gated by [`PkceConfig::allow_plain`].
#[must_use]
pub fn validate_authorization_request(
    challenge: Option<&str>,
    method: Option<&str>,
    config: &PkceConfig,
) -> AuthRequestValidation {
    if challenge.is_none() {
        if config.require_pkce {
            return AuthRequestValidation::fail(AuthRequestErrorKind::PkceRequired);
        }
        return AuthRequestValidation::ok();
    }

    let method = method.unwrap_or("plain");
    match CodeChallengeMethod::parse(method) {
        Ok(CodeChallengeMethod::Plain) if !config.allow_plain => {
            AuthRequestValidation::fail(AuthRequestErrorKind::InvalidMethod)
        }
        Ok(_) => AuthRequestValidation::ok(),
        Err(_) => AuthRequestValidation::fail(AuthRequestErrorKind::InvalidMethod),
    }
}
