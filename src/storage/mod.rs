//! Abstract storage collaborators for the refresh token store.
//!
//! The record store is the source of truth; the cache is purely an
//! optimization and its failures must never fail an operation.

pub mod memory;

pub use memory::{MemoryCache, MemoryRecordStore};

use crate::error::AuthError;
use crate::refresh::record::RefreshTokenRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Keyed record store for refresh token records.
///
/// Implementations must apply each mutation atomically; `revoke_*` methods
/// report whether the revocation was newly applied so callers get
/// compare-and-swap semantics under concurrent revocation.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record.
    ///
    /// Must refuse a second live record with the same
    /// `(token_fingerprint, token_type)`.
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), AuthError>;

    /// Find the live record matching a fingerprint within a partition.
    async fn find_live_by_fingerprint(
        &self,
        fingerprint: &str,
        token_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// Mark matching non-revoked records revoked. Returns `true` only if
    /// at least one revocation was newly applied.
    async fn revoke_by_fingerprint(
        &self,
        fingerprint: &str,
        token_type: &str,
    ) -> Result<bool, AuthError>;

    /// Revoke a single record by id, scoped to its owner and partition.
    async fn revoke_by_id(
        &self,
        user_id: &str,
        token_id: &str,
        token_type: &str,
    ) -> Result<bool, AuthError>;

    /// Revoke every non-revoked record of a user within a partition.
    /// Returns the number of newly revoked records.
    async fn revoke_all_for_user(&self, user_id: &str, token_type: &str)
        -> Result<u64, AuthError>;

    /// List a user's records within a partition, newest first.
    async fn list_for_user(
        &self,
        user_id: &str,
        token_type: &str,
        limit: usize,
        active_only: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshTokenRecord>, AuthError>;

    /// Apply non-identity field updates to a record. Identity fields are
    /// stripped by the caller before this is invoked.
    async fn apply_update(
        &self,
        token_id: &str,
        token_type: &str,
        fields: HashMap<String, serde_json::Value>,
    ) -> Result<bool, AuthError>;

    /// Physically delete records in the partition whose expiry is older
    /// than `horizon`. Returns the number deleted.
    async fn delete_expired_before(
        &self,
        token_type: &str,
        horizon: DateTime<Utc>,
    ) -> Result<u64, AuthError>;
}

/// Opaque-keyed cache with TTL.
#[async_trait]
pub trait TokenCache: Send + Sync {
    /// Fetch a cached value.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AuthError>;

    /// Store a value with a bounded TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), AuthError>;

    /// Drop a cached value.
    async fn delete(&self, key: &str) -> Result<(), AuthError>;
}
