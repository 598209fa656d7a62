//! Error taxonomy for the crate.
//!
//! Only malformed input, construction problems, and collaborator failures
//! are errors. Verification failures (bad signature, expired claims, hash
//! mismatch) are uniform negative results on the operations themselves so
//! callers outside the trust boundary get no failure oracle.

use thiserror::Error;

/// Errors surfaced by authentication primitives.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Malformed caller input (wrong length, bad alphabet, empty field).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Named algorithm is not supported.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The secure random source refused to produce bytes.
    #[error("Secure random source unavailable: {0}")]
    RandomSource(String),

    /// Claim set could not be serialized for signing.
    #[error("Token encoding error: {0}")]
    Encoding(String),

    /// Record store collaborator reported a failure.
    #[error("Record store error: {0}")]
    Store(String),

    /// Cache collaborator reported a failure.
    ///
    /// Lifecycle operations swallow these and degrade to cache-miss; the
    /// variant exists for cache implementations to report through.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller lacks a required capability.
    #[error("Missing capability: {0}")]
    MissingCapability(String),

    /// Internal invariant failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Create a `Validation` error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an `UnsupportedAlgorithm` error.
    #[must_use]
    pub fn unsupported_algorithm(name: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm(name.into())
    }

    /// Create a `RandomSource` error.
    #[must_use]
    pub fn random_source(msg: impl Into<String>) -> Self {
        Self::RandomSource(msg.into())
    }

    /// Create an `Encoding` error.
    #[must_use]
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Create a `Store` error.
    #[must_use]
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a `Cache` error.
    #[must_use]
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a `Config` error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an `Internal` error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
