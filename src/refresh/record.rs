//! Refresh token records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caller-supplied request metadata attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Originating IP address, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Originating user agent, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Any other caller-supplied fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A stored refresh token record.
///
/// The plaintext token is never stored; `token_fingerprint` is the keyed
/// hash and the sole lookup key. Records are partitioned by `token_type`
/// so independent token families never collide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// Record id.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Keyed hash of the token.
    pub token_fingerprint: String,
    /// Token family partition tag.
    pub token_type: String,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Whether the record has been revoked.
    pub revoked: bool,
    /// Revocation instant, if revoked.
    pub revoked_at: Option<DateTime<Utc>>,
    /// Request metadata captured at issuance.
    pub metadata: TokenMetadata,
}

impl RefreshTokenRecord {
    /// Create a live record with a fresh id.
    #[must_use]
    pub fn new(
        user_id: String,
        token_fingerprint: String,
        token_type: String,
        expires_at: DateTime<Utc>,
        metadata: TokenMetadata,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            token_fingerprint,
            token_type,
            created_at: Utc::now(),
            expires_at,
            revoked: false,
            revoked_at: None,
            metadata,
        }
    }

    /// Mark the record revoked.
    pub fn revoke(&mut self) {
        self.revoked = true;
        self.revoked_at = Some(Utc::now());
    }

    /// Whether the record is live (not revoked, not expired) at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}

/// Caller-facing record shape. Excludes the fingerprint, which must never
/// leave the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenView {
    /// Record id.
    pub id: String,
    /// Owning user.
    pub user_id: String,
    /// Token family partition tag.
    pub token_type: String,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Whether the record has been revoked.
    pub revoked: bool,
    /// Request metadata captured at issuance.
    pub metadata: TokenMetadata,
}

impl From<RefreshTokenRecord> for RefreshTokenView {
    fn from(record: RefreshTokenRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            token_type: record.token_type,
            created_at: record.created_at,
            expires_at: record.expires_at,
            revoked: record.revoked,
            metadata: record.metadata,
        }
    }
}
