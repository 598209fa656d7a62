//! Refresh token lifecycle orchestration.
//!
//! Tokens are hashed at every entry point; no lookup or write ever sees
//! plaintext. The record store is the source of truth and the cache is a
//! read-through optimization whose failures degrade to misses.

use crate::error::AuthError;
use crate::hasher::KeyedHasher;
use crate::refresh::record::{RefreshTokenRecord, RefreshTokenView, TokenMetadata};
use crate::storage::{RecordStore, TokenCache};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default cache TTL. Kept well below realistic token lifetimes so
/// revocation converges within one TTL window even when invalidation is
/// skipped (the administrative paths have no cache key to invalidate).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default audit window records are kept past expiry before the sweep
/// physically deletes them.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Fields that identify a record and must never be updated.
const IDENTITY_FIELDS: [&str; 5] = [
    "id",
    "token_fingerprint",
    "user_id",
    "created_at",
    "token_type",
];

/// Manages the refresh token lifecycle against a record store and an
/// optional cache, partitioned by a `token_type` tag.
pub struct RefreshTokenStore {
    records: Arc<dyn RecordStore>,
    cache: Option<Arc<dyn TokenCache>>,
    hasher: KeyedHasher,
    token_type: String,
    cache_ttl: Duration,
    retention: ChronoDuration,
}

impl RefreshTokenStore {
    /// Create a store over a record store, without a cache.
    #[must_use]
    pub fn new(
        records: Arc<dyn RecordStore>,
        hasher: KeyedHasher,
        token_type: impl Into<String>,
    ) -> Self {
        Self {
            records,
            cache: None,
            hasher,
            token_type: token_type.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            retention: ChronoDuration::days(DEFAULT_RETENTION_DAYS),
        }
    }

    /// Attach a read-through cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the cache TTL.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Override the post-expiry retention window used by the sweep.
    #[must_use]
    pub fn with_retention(mut self, retention: ChronoDuration) -> Self {
        self.retention = retention;
        self
    }

    /// The partition tag this store operates in.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    fn cache_key(&self, fingerprint: &str) -> String {
        format!("refresh:{}:{}", self.token_type, fingerprint)
    }

    /// Store a new refresh token for a user.
    ///
    /// # Errors
    ///
    /// Surfaces record store failures, including a live fingerprint
    /// conflict within the partition.
    pub async fn store(
        &self,
        user_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
        metadata: TokenMetadata,
    ) -> Result<(), AuthError> {
        let fingerprint = self.hasher.hash(token);
        let record = RefreshTokenRecord::new(
            user_id.to_string(),
            fingerprint,
            self.token_type.clone(),
            expires_at,
            metadata,
        );
        self.records.insert(record).await?;

        info!(
            user_id = %user_id,
            token_type = %self.token_type,
            "Stored refresh token"
        );
        Ok(())
    }

    /// Validate a token, returning its live record if one exists.
    ///
    /// Consults the cache by fingerprint first; cache failures are logged
    /// and treated as misses.
    ///
    /// # Errors
    ///
    /// Surfaces record store failures only.
    pub async fn validate(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let fingerprint = self.hasher.hash(token);
        let now = Utc::now();

        if let Some(record) = self.cache_get(&fingerprint).await {
            // Cached entries may outlive expiry within the TTL window.
            if record.is_live(now) {
                return Ok(Some(record));
            }
            return Ok(None);
        }

        let found = self
            .records
            .find_live_by_fingerprint(&fingerprint, &self.token_type, now)
            .await?;

        if let Some(record) = &found {
            self.cache_put(&fingerprint, record).await;
        }
        Ok(found)
    }

    /// Revoke a token. Returns `true` only if the revocation was newly
    /// applied to a record.
    ///
    /// The cache entry is invalidated before the store update so a revoked
    /// token is never still cache-valid after the store reports success.
    ///
    /// # Errors
    ///
    /// Surfaces record store failures.
    pub async fn revoke(&self, token: &str) -> Result<bool, AuthError> {
        let fingerprint = self.hasher.hash(token);
        self.cache_invalidate(&fingerprint).await;

        let newly_applied = self
            .records
            .revoke_by_fingerprint(&fingerprint, &self.token_type)
            .await?;

        if newly_applied {
            info!(token_type = %self.token_type, "Revoked refresh token");
        }
        Ok(newly_applied)
    }

    /// Revoke a single record by id without knowing the token.
    ///
    /// Scoped to `(user_id, token_type)`. The cache cannot be invalidated
    /// without the fingerprint; staleness converges within one TTL window.
    ///
    /// # Errors
    ///
    /// Surfaces record store failures.
    pub async fn revoke_by_id(&self, user_id: &str, token_id: &str) -> Result<bool, AuthError> {
        let newly_applied = self
            .records
            .revoke_by_id(user_id, token_id, &self.token_type)
            .await?;

        if newly_applied {
            info!(
                user_id = %user_id,
                token_id = %token_id,
                token_type = %self.token_type,
                "Revoked refresh token by id"
            );
        }
        Ok(newly_applied)
    }

    /// Revoke all of a user's tokens in this partition. Returns the count
    /// of newly revoked records.
    ///
    /// # Errors
    ///
    /// Surfaces record store failures.
    pub async fn revoke_all_for_user(&self, user_id: &str) -> Result<u64, AuthError> {
        let count = self
            .records
            .revoke_all_for_user(user_id, &self.token_type)
            .await?;

        info!(
            user_id = %user_id,
            count = %count,
            token_type = %self.token_type,
            "Revoked all user refresh tokens"
        );
        Ok(count)
    }

    /// Rotate a token: revoke the old one and store its replacement.
    ///
    /// Returns `false` without storing the new token when the old token is
    /// not live or its revocation was not newly applied, so a failed or
    /// lost revoke never leaves an orphan live token. Concurrent rotations
    /// of one token resolve to a single winner when the record store
    /// applies revocations atomically.
    ///
    /// # Errors
    ///
    /// Surfaces record store failures; an insert failure after a
    /// successful revoke propagates with the old token already revoked.
    pub async fn rotate(
        &self,
        old_token: &str,
        new_token: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
        metadata: TokenMetadata,
    ) -> Result<bool, AuthError> {
        if self.validate(old_token).await?.is_none() {
            debug!(token_type = %self.token_type, "Rotation rejected: old token not live");
            return Ok(false);
        }

        if !self.revoke(old_token).await? {
            warn!(
                user_id = %user_id,
                token_type = %self.token_type,
                "Rotation aborted: revocation not newly applied"
            );
            return Ok(false);
        }

        self.store(user_id, new_token, expires_at, metadata).await?;

        info!(
            user_id = %user_id,
            token_type = %self.token_type,
            "Rotated refresh token"
        );
        Ok(true)
    }

    /// List a user's records, newest first, without fingerprints.
    ///
    /// # Errors
    ///
    /// Surfaces record store failures.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
        active_only: bool,
    ) -> Result<Vec<RefreshTokenView>, AuthError> {
        let records = self
            .records
            .list_for_user(user_id, &self.token_type, limit, active_only, Utc::now())
            .await?;
        Ok(records.into_iter().map(RefreshTokenView::from).collect())
    }

    /// Update non-identity fields of a record.
    ///
    /// Attempts to modify identity fields (`id`, `token_fingerprint`,
    /// `user_id`, `created_at`, `token_type`) are stripped before the
    /// update is applied.
    ///
    /// # Errors
    ///
    /// Surfaces record store failures and invalid field values.
    pub async fn update(
        &self,
        token_id: &str,
        mut fields: HashMap<String, serde_json::Value>,
    ) -> Result<bool, AuthError> {
        for field in IDENTITY_FIELDS {
            if fields.remove(field).is_some() {
                warn!(
                    token_id = %token_id,
                    field = %field,
                    "Stripped identity field from update"
                );
            }
        }
        if fields.is_empty() {
            return Ok(false);
        }
        self.records
            .apply_update(token_id, &self.token_type, fields)
            .await
    }

    /// Physically delete records expired longer ago than the retention
    /// window. Returns the number deleted. Live and recently expired
    /// records are never touched.
    ///
    /// # Errors
    ///
    /// Surfaces record store failures.
    pub async fn sweep_expired(&self) -> Result<u64, AuthError> {
        let horizon = Utc::now() - self.retention;
        let count = self
            .records
            .delete_expired_before(&self.token_type, horizon)
            .await?;

        info!(
            count = %count,
            token_type = %self.token_type,
            "Swept expired refresh tokens"
        );
        Ok(count)
    }

    async fn cache_get(&self, fingerprint: &str) -> Option<RefreshTokenRecord> {
        let cache = self.cache.as_ref()?;
        match cache.get(&self.cache_key(fingerprint)).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!(error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!(error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    async fn cache_put(&self, fingerprint: &str, record: &RefreshTokenRecord) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let Ok(bytes) = serde_json::to_vec(record) else {
            return;
        };
        if let Err(e) = cache
            .set(&self.cache_key(fingerprint), &bytes, self.cache_ttl)
            .await
        {
            debug!(error = %e, "Cache write failed, continuing");
        }
    }

    async fn cache_invalidate(&self, fingerprint: &str) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if let Err(e) = cache.delete(&self.cache_key(fingerprint)).await {
            debug!(error = %e, "Cache invalidation failed, continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryCache, MemoryRecordStore};
    use serde_json::json;

    fn store_with_cache() -> RefreshTokenStore {
        RefreshTokenStore::new(
            Arc::new(MemoryRecordStore::new()),
            KeyedHasher::new("test-secret").unwrap(),
            "oauth",
        )
        .with_cache(Arc::new(MemoryCache::new()))
    }

    fn expiry() -> DateTime<Utc> {
        Utc::now() + ChronoDuration::hours(1)
    }

    #[tokio::test]
    async fn test_store_then_validate() {
        let store = store_with_cache();
        store
            .store("user-1", "token-1", expiry(), TokenMetadata::default())
            .await
            .unwrap();

        let record = store.validate("token-1").await.unwrap().unwrap();
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.token_type, "oauth");
        assert!(!record.revoked);

        // Second validate is served from cache and agrees.
        let cached = store.validate("token-1").await.unwrap().unwrap();
        assert_eq!(cached.id, record.id);
    }

    #[tokio::test]
    async fn test_validate_unknown_token() {
        let store = store_with_cache();
        assert!(store.validate("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_then_validate() {
        let store = store_with_cache();
        store
            .store("user-1", "token-1", expiry(), TokenMetadata::default())
            .await
            .unwrap();
        // Warm the cache first so revocation must invalidate it.
        assert!(store.validate("token-1").await.unwrap().is_some());

        assert!(store.revoke("token-1").await.unwrap());
        assert!(store.validate("token-1").await.unwrap().is_none());

        // Second revoke is not newly applied.
        assert!(!store.revoke("token-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_rotate_swaps_tokens() {
        let store = store_with_cache();
        store
            .store("user-1", "token-a", expiry(), TokenMetadata::default())
            .await
            .unwrap();

        let rotated = store
            .rotate("token-a", "token-b", "user-1", expiry(), TokenMetadata::default())
            .await
            .unwrap();
        assert!(rotated);

        assert!(store.validate("token-a").await.unwrap().is_none());
        assert!(store.validate("token-b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rotate_rejects_unknown_old_token() {
        let store = store_with_cache();
        let rotated = store
            .rotate("ghost", "token-b", "user-1", expiry(), TokenMetadata::default())
            .await
            .unwrap();
        assert!(!rotated);
        assert!(store.validate("token-b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_all_for_user() {
        let store = store_with_cache();
        store
            .store("user-1", "token-1", expiry(), TokenMetadata::default())
            .await
            .unwrap();
        store
            .store("user-1", "token-2", expiry(), TokenMetadata::default())
            .await
            .unwrap();
        store
            .store("user-2", "token-3", expiry(), TokenMetadata::default())
            .await
            .unwrap();

        assert_eq!(store.revoke_all_for_user("user-1").await.unwrap(), 2);
        assert!(store.validate("token-1").await.unwrap().is_none());
        assert!(store.validate("token-3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_revoke_by_id_scoped_to_user() {
        let store = store_with_cache();
        store
            .store("user-1", "token-1", expiry(), TokenMetadata::default())
            .await
            .unwrap();
        let record = store.validate("token-1").await.unwrap().unwrap();

        assert!(!store.revoke_by_id("user-2", &record.id).await.unwrap());
        assert!(store.revoke_by_id("user-1", &record.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_excludes_fingerprints() {
        let store = store_with_cache();
        store
            .store("user-1", "token-1", expiry(), TokenMetadata::default())
            .await
            .unwrap();

        let views = store.list_for_user("user-1", 10, true).await.unwrap();
        assert_eq!(views.len(), 1);
        let json = serde_json::to_value(&views[0]).unwrap();
        assert!(json.get("token_fingerprint").is_none());
    }

    fn store_without_cache() -> RefreshTokenStore {
        RefreshTokenStore::new(
            Arc::new(MemoryRecordStore::new()),
            KeyedHasher::new("test-secret").unwrap(),
            "oauth",
        )
    }

    #[tokio::test]
    async fn test_update_strips_identity_fields() {
        // No cache: updates do not invalidate cached entries (they key by
        // fingerprint, which update callers do not hold).
        let store = store_without_cache();
        store
            .store("user-1", "token-1", expiry(), TokenMetadata::default())
            .await
            .unwrap();
        let record = store.validate("token-1").await.unwrap().unwrap();

        let mut fields = HashMap::new();
        fields.insert("user_id".to_string(), json!("attacker"));
        fields.insert("token_fingerprint".to_string(), json!("forged"));
        fields.insert("device_name".to_string(), json!("laptop"));
        assert!(store.update(&record.id, fields).await.unwrap());

        let after = store.validate("token-1").await.unwrap().unwrap();
        assert_eq!(after.user_id, "user-1");
        assert_eq!(after.metadata.extra["device_name"], json!("laptop"));
    }

    #[tokio::test]
    async fn test_update_with_only_identity_fields_is_noop() {
        let store = store_without_cache();
        store
            .store("user-1", "token-1", expiry(), TokenMetadata::default())
            .await
            .unwrap();
        let record = store.validate("token-1").await.unwrap().unwrap();

        let mut fields = HashMap::new();
        fields.insert("id".to_string(), json!("new-id"));
        assert!(!store.update(&record.id, fields).await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_expired_respects_retention() {
        let records = Arc::new(MemoryRecordStore::new());
        let store = RefreshTokenStore::new(
            records.clone(),
            KeyedHasher::new("test-secret").unwrap(),
            "oauth",
        );

        store
            .store(
                "user-1",
                "stale",
                Utc::now() - ChronoDuration::days(10),
                TokenMetadata::default(),
            )
            .await
            .unwrap();
        store
            .store(
                "user-1",
                "recently-expired",
                Utc::now() - ChronoDuration::days(1),
                TokenMetadata::default(),
            )
            .await
            .unwrap();
        store
            .store("user-1", "live", expiry(), TokenMetadata::default())
            .await
            .unwrap();

        assert_eq!(store.sweep_expired().await.unwrap(), 1);
        assert_eq!(records.len().await, 2);
        assert!(store.validate("live").await.unwrap().is_some());
    }
}
