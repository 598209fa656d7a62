//! Keyed one-way token fingerprinting.
//!
//! Plaintext tokens are never stored; the keyed HMAC digest computed here
//! is the only persisted form, and equality on it is the sole lookup key.

use crate::error::AuthError;
use ring::hmac;
use subtle::ConstantTimeEq;

/// Digest algorithm for keyed hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// HMAC with SHA-256 (default).
    Sha256,
    /// HMAC with SHA-384.
    Sha384,
    /// HMAC with SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// Parse algorithm from a configuration string.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnsupportedAlgorithm` for unknown names.
    pub fn parse(s: &str) -> Result<Self, AuthError> {
        match s.to_uppercase().replace('-', "").as_str() {
            "SHA256" => Ok(Self::Sha256),
            "SHA384" => Ok(Self::Sha384),
            "SHA512" => Ok(Self::Sha512),
            _ => Err(AuthError::unsupported_algorithm(s)),
        }
    }

    /// Get the canonical algorithm name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
        }
    }

    fn hmac_algorithm(self) -> hmac::Algorithm {
        match self {
            Self::Sha256 => hmac::HMAC_SHA256,
            Self::Sha384 => hmac::HMAC_SHA384,
            Self::Sha512 => hmac::HMAC_SHA512,
        }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha256
    }
}

/// Keyed hasher producing deterministic token fingerprints.
pub struct KeyedHasher {
    key: hmac::Key,
    algorithm: HashAlgorithm,
}

impl KeyedHasher {
    /// Create a hasher with the default SHA-256 digest.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the secret is empty.
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        Self::with_algorithm(secret, HashAlgorithm::default())
    }

    /// Create a hasher with an explicit digest algorithm.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the secret is empty.
    pub fn with_algorithm(secret: &str, algorithm: HashAlgorithm) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::validation("hasher secret must not be empty"));
        }
        Ok(Self {
            key: hmac::Key::new(algorithm.hmac_algorithm(), secret.as_bytes()),
            algorithm,
        })
    }

    /// The configured digest algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Compute the hex fingerprint of a token.
    ///
    /// Deterministic for a fixed (secret, algorithm, token) triple.
    #[must_use]
    pub fn hash(&self, token: &str) -> String {
        let tag = hmac::sign(&self.key, token.as_bytes());
        hex::encode(tag.as_ref())
    }

    /// Verify a token against a stored fingerprint.
    ///
    /// Recomputes the digest and compares with `subtle::ConstantTimeEq`;
    /// the length check leaks only digest length, which is public.
    #[must_use]
    pub fn verify(&self, token: &str, stored_digest: &str) -> bool {
        let computed = self.hash(token);
        let computed_bytes = computed.as_bytes();
        let stored_bytes = stored_digest.as_bytes();

        if computed_bytes.len() != stored_bytes.len() {
            return false;
        }

        computed_bytes.ct_eq(stored_bytes).into()
    }
}
