//! Claim sets carried by compact signed tokens.

use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON claim set. Immutable once signed; the codec verifies over the
/// raw encoded segments, so claim ordering never affects validity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    /// Create an empty claim set.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Insert or replace a claim.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Builder-style claim insertion.
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Look up a claim by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The `exp` claim as integer seconds since the epoch, if present and
    /// numeric.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.0.get("exp").and_then(Value::as_i64)
    }

    /// Number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the claim set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Builder for standard claim sets.
pub struct ClaimsBuilder {
    issuer: String,
    subject: Option<Value>,
    audience: Vec<String>,
    ttl_seconds: i64,
    custom: Vec<(String, Value)>,
}

impl ClaimsBuilder {
    /// Start a claim set for the given issuer.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            subject: None,
            audience: Vec::new(),
            ttl_seconds: 900, // 15 minutes default
            custom: Vec::new(),
        }
    }

    /// Set the subject claim.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<Value>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the audience claim.
    #[must_use]
    pub fn audience(mut self, audience: Vec<String>) -> Self {
        self.audience = audience;
        self
    }

    /// Set the token lifetime in seconds.
    #[must_use]
    pub fn ttl_seconds(mut self, ttl: i64) -> Self {
        self.ttl_seconds = ttl;
        self
    }

    /// Add a custom claim.
    #[must_use]
    pub fn custom_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.push((name.into(), value.into()));
        self
    }

    /// Build the claim set with `iat`, `exp`, and a fresh `jti` stamped.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the subject is missing.
    pub fn build(self) -> Result<ClaimSet, AuthError> {
        let subject = self
            .subject
            .ok_or_else(|| AuthError::validation("subject is required"))?;

        let now = chrono::Utc::now().timestamp();
        let mut claims = ClaimSet::new()
            .with_claim("iss", self.issuer)
            .with_claim("sub", subject)
            .with_claim("iat", now)
            .with_claim("exp", now + self.ttl_seconds)
            .with_claim("jti", uuid::Uuid::new_v4().to_string());

        if !self.audience.is_empty() {
            claims.insert("aud", self.audience);
        }
        for (name, value) in self.custom {
            claims.insert(name, value);
        }

        Ok(claims)
    }
}
