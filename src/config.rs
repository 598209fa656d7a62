//! Explicit host-supplied configuration.
//!
//! There is no process-wide configuration state: hosts construct an
//! `AuthConfig` (programmatically or from the environment) and pass it to
//! the components they build from it.

use crate::error::AuthError;
use crate::hasher::{HashAlgorithm, KeyedHasher};
use crate::jwt::codec::{CompactTokenCodec, SigningAlgorithm};
use std::env;
use std::time::Duration;
use zeroize::Zeroizing;

/// PKCE policy knobs.
#[derive(Debug, Clone, Copy)]
pub struct PkceConfig {
    /// Whether authorization requests must carry a PKCE challenge.
    pub require_pkce: bool,
    /// Whether the RFC-permitted but weak `plain` method is accepted.
    pub allow_plain: bool,
}

impl Default for PkceConfig {
    fn default() -> Self {
        Self {
            require_pkce: false,
            allow_plain: true,
        }
    }
}

/// Library configuration supplied by the host at startup.
pub struct AuthConfig {
    /// Shared secret for keyed hashing and token signing. Zeroized on
    /// drop.
    secret: Zeroizing<String>,
    /// Digest algorithm for token fingerprints.
    pub hash_algorithm: HashAlgorithm,
    /// Signing algorithm for compact tokens.
    pub signing_algorithm: SigningAlgorithm,
    /// Refresh token cache TTL.
    pub cache_ttl: Duration,
    /// Post-expiry retention window for the sweep.
    pub retention: chrono::Duration,
    /// PKCE policy.
    pub pkce: PkceConfig,
}

impl AuthConfig {
    /// Create a configuration with defaults around the given secret.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the secret is empty.
    pub fn new(secret: impl Into<String>) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AuthError::config("secret must not be empty"));
        }
        Ok(Self {
            secret: Zeroizing::new(secret),
            hash_algorithm: HashAlgorithm::default(),
            signing_algorithm: SigningAlgorithm::default(),
            cache_ttl: Duration::from_secs(300),
            retention: chrono::Duration::days(7),
            pkce: PkceConfig::default(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Recognized variables: `AUTH_SECRET` (required), `AUTH_HASH_ALGORITHM`
    /// (default `SHA256`), `AUTH_SIGNING_ALGORITHM` (default `HS256`),
    /// `AUTH_CACHE_TTL` seconds (default 300), `AUTH_RETENTION_DAYS`
    /// (default 7), `AUTH_PKCE_REQUIRED` (default false),
    /// `AUTH_PKCE_ALLOW_PLAIN` (default true).
    ///
    /// # Errors
    ///
    /// Returns an error if `AUTH_SECRET` is missing or empty, or any
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let secret = env::var("AUTH_SECRET")
            .map_err(|_| AuthError::config("AUTH_SECRET is required"))?;
        let mut config = Self::new(secret)?;

        if let Ok(name) = env::var("AUTH_HASH_ALGORITHM") {
            config.hash_algorithm = HashAlgorithm::parse(&name)?;
        }
        if let Ok(name) = env::var("AUTH_SIGNING_ALGORITHM") {
            config.signing_algorithm = SigningAlgorithm::parse(&name)?;
        }
        config.cache_ttl = Duration::from_secs(parse_env("AUTH_CACHE_TTL", 300)?);
        config.retention = chrono::Duration::days(parse_env("AUTH_RETENTION_DAYS", 7)?);
        config.pkce = PkceConfig {
            require_pkce: parse_env("AUTH_PKCE_REQUIRED", false)?,
            allow_plain: parse_env("AUTH_PKCE_ALLOW_PLAIN", true)?,
        };

        Ok(config)
    }

    /// Set the fingerprint digest algorithm.
    #[must_use]
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Set the compact token signing algorithm.
    #[must_use]
    pub fn with_signing_algorithm(mut self, algorithm: SigningAlgorithm) -> Self {
        self.signing_algorithm = algorithm;
        self
    }

    /// Set the refresh token cache TTL.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the PKCE policy.
    #[must_use]
    pub fn with_pkce(mut self, pkce: PkceConfig) -> Self {
        self.pkce = pkce;
        self
    }

    /// Build a keyed hasher from this configuration.
    ///
    /// # Errors
    ///
    /// Propagates hasher construction errors.
    pub fn keyed_hasher(&self) -> Result<KeyedHasher, AuthError> {
        KeyedHasher::with_algorithm(&self.secret, self.hash_algorithm)
    }

    /// Build a compact token codec from this configuration.
    ///
    /// # Errors
    ///
    /// Propagates codec construction errors.
    pub fn token_codec(&self) -> Result<CompactTokenCodec, AuthError> {
        CompactTokenCodec::with_algorithm(&self.secret, self.signing_algorithm)
    }
}

/// Parse an environment variable with a default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AuthError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| AuthError::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
