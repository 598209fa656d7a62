//! Cryptographically secure opaque token generation.
//!
//! Tokens produced here are bearer secrets: they are handed to the caller
//! once, fingerprinted by [`crate::hasher::KeyedHasher`] for storage, and
//! never persisted in plaintext.

use crate::error::AuthError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

/// Canonical length for authorization codes (hex characters).
pub const AUTHORIZATION_CODE_LENGTH: usize = 32;

/// Canonical length for opaque access tokens (hex characters).
pub const ACCESS_TOKEN_LENGTH: usize = 48;

/// Canonical length for refresh tokens (hex characters).
pub const REFRESH_TOKEN_LENGTH: usize = 64;

/// Minimum PKCE verifier length per RFC 7636.
pub const PKCE_VERIFIER_MIN_LENGTH: usize = 43;

/// Maximum PKCE verifier length per RFC 7636.
pub const PKCE_VERIFIER_MAX_LENGTH: usize = 128;

/// Generates security tokens from an injected cryptographically secure
/// random source.
///
/// The `CryptoRng` bound makes the source a construction-time decision;
/// there is no runtime probing and no deterministic fallback. A source
/// that fails to produce bytes surfaces as [`AuthError::RandomSource`].
pub struct RandomTokenGenerator<R = OsRng> {
    rng: R,
}

impl RandomTokenGenerator<OsRng> {
    /// Create a generator backed by the operating system CSPRNG.
    #[must_use]
    pub fn new() -> Self {
        Self { rng: OsRng }
    }
}

impl Default for RandomTokenGenerator<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RngCore + CryptoRng> RandomTokenGenerator<R> {
    /// Create a generator over a caller-supplied secure random source.
    #[must_use]
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a random hex token of exactly `length` characters.
    ///
    /// # Errors
    ///
    /// Returns a validation error for zero or odd `length` (hex output is
    /// two characters per byte), and [`AuthError::RandomSource`] if the
    /// random source fails.
    pub fn generate(&mut self, length: usize) -> Result<String, AuthError> {
        if length == 0 {
            return Err(AuthError::validation("token length must be positive"));
        }
        if length % 2 != 0 {
            return Err(AuthError::validation(format!(
                "token length must be even, got {}",
                length
            )));
        }

        let mut bytes = vec![0u8; length / 2];
        self.rng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::random_source(e.to_string()))?;
        Ok(hex::encode(bytes))
    }

    /// Generate an authorization code.
    pub fn authorization_code(&mut self) -> Result<String, AuthError> {
        self.generate(AUTHORIZATION_CODE_LENGTH)
    }

    /// Generate an opaque access token.
    pub fn access_token(&mut self) -> Result<String, AuthError> {
        self.generate(ACCESS_TOKEN_LENGTH)
    }

    /// Generate a refresh token.
    pub fn refresh_token(&mut self) -> Result<String, AuthError> {
        self.generate(REFRESH_TOKEN_LENGTH)
    }

    /// Generate a PKCE code verifier of exactly `length` characters.
    ///
    /// 96 random bytes encode to 128 base64url characters; truncating to
    /// the requested length keeps at least 256 bits of source entropy even
    /// at the 43-character minimum, above the RFC 7636 128-bit floor.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `length` is outside [43, 128].
    pub fn pkce_verifier(&mut self, length: usize) -> Result<String, AuthError> {
        if !(PKCE_VERIFIER_MIN_LENGTH..=PKCE_VERIFIER_MAX_LENGTH).contains(&length) {
            return Err(AuthError::validation(format!(
                "PKCE verifier length must be 43-128, got {}",
                length
            )));
        }

        let mut bytes = [0u8; 96];
        self.rng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| AuthError::random_source(e.to_string()))?;

        let mut verifier = URL_SAFE_NO_PAD.encode(bytes);
        verifier.truncate(length);
        Ok(verifier)
    }
}
