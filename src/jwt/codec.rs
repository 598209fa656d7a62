//! Compact token codec: `header.claims.signature` encode and verify.
//!
//! Decoding returns a single uniform `None` for every failure mode so
//! callers outside the trust boundary cannot distinguish a bad signature
//! from an expired or malformed token.

use crate::error::AuthError;
use crate::jwt::claims::ClaimSet;
use crate::jwt::encoding::{base64url_decode, base64url_encode};
use ring::hmac;
use serde::{Deserialize, Serialize};

/// Symmetric signing algorithm for compact tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256 (default).
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
}

impl SigningAlgorithm {
    /// Parse algorithm from a configuration string.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnsupportedAlgorithm` for unknown names.
    pub fn parse(s: &str) -> Result<Self, AuthError> {
        match s.to_uppercase().as_str() {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            _ => Err(AuthError::unsupported_algorithm(s)),
        }
    }

    /// Get the algorithm name for the token header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
        }
    }

    fn hmac_algorithm(self) -> hmac::Algorithm {
        match self {
            Self::HS256 => hmac::HMAC_SHA256,
            Self::HS384 => hmac::HMAC_SHA384,
            Self::HS512 => hmac::HMAC_SHA512,
        }
    }
}

impl Default for SigningAlgorithm {
    fn default() -> Self {
        Self::HS256
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    typ: String,
    alg: String,
}

/// Stateless codec for compact signed tokens.
pub struct CompactTokenCodec {
    key: hmac::Key,
    algorithm: SigningAlgorithm,
}

impl CompactTokenCodec {
    /// Create a codec with the default HS256 algorithm.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the secret is empty.
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        Self::with_algorithm(secret, SigningAlgorithm::default())
    }

    /// Create a codec with an explicit signing algorithm.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the secret is empty.
    pub fn with_algorithm(secret: &str, algorithm: SigningAlgorithm) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::validation("codec secret must not be empty"));
        }
        Ok(Self {
            key: hmac::Key::new(algorithm.hmac_algorithm(), secret.as_bytes()),
            algorithm,
        })
    }

    /// The configured signing algorithm.
    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Encode and sign a claim set as `header.claims.signature`.
    ///
    /// # Errors
    ///
    /// Returns an encoding error if the claims cannot be serialized.
    pub fn encode(&self, claims: &ClaimSet) -> Result<String, AuthError> {
        let header = Header {
            typ: "JWT".to_string(),
            alg: self.algorithm.as_str().to_string(),
        };
        let header_json =
            serde_json::to_vec(&header).map_err(|e| AuthError::encoding(e.to_string()))?;
        let claims_json =
            serde_json::to_vec(claims).map_err(|e| AuthError::encoding(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            base64url_encode(&header_json),
            base64url_encode(&claims_json)
        );
        let tag = hmac::sign(&self.key, signing_input.as_bytes());

        Ok(format!("{}.{}", signing_input, base64url_encode(tag.as_ref())))
    }

    /// Decode and verify a token against the current instant.
    ///
    /// Returns the claims only when the token has exactly three segments,
    /// the header declares this codec's algorithm, the signature verifies,
    /// and any `exp` claim is numeric and still in the future.
    #[must_use]
    pub fn decode(&self, token: &str) -> Option<ClaimSet> {
        self.decode_at(token, chrono::Utc::now().timestamp())
    }

    /// Decode and verify a token against an explicit clock reading.
    ///
    /// The validity window is closed-open: `now >= exp` is invalid.
    #[must_use]
    pub fn decode_at(&self, token: &str, now: i64) -> Option<ClaimSet> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return None;
        }

        let header_bytes = base64url_decode(segments[0])?;
        let header: Header = serde_json::from_slice(&header_bytes).ok()?;
        // Algorithm pinning: the header must declare this codec's
        // configured algorithm.
        if header.alg != self.algorithm.as_str() {
            return None;
        }

        // Verify over the raw segments before trusting the claims.
        let signature = base64url_decode(segments[2])?;
        let signing_input_len = segments[0].len() + 1 + segments[1].len();
        hmac::verify(&self.key, token[..signing_input_len].as_bytes(), &signature).ok()?;

        let claims_bytes = base64url_decode(segments[1])?;
        let claims: ClaimSet = serde_json::from_slice(&claims_bytes).ok()?;

        if let Some(exp_value) = claims.get("exp") {
            let exp = exp_value.as_i64()?;
            if now >= exp {
                return None;
            }
        }

        Some(claims)
    }
}
