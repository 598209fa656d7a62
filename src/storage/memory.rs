//! In-memory collaborator implementations.
//!
//! Used by tests and by hosts that embed the library without an external
//! record store or cache.

use crate::error::AuthError;
use crate::refresh::record::RefreshTokenRecord;
use crate::storage::{RecordStore, TokenCache};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// In-memory record store keyed by record id.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, including revoked and expired
    /// ones awaiting the sweep.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), AuthError> {
        let mut records = self.records.write().await;
        let now = Utc::now();
        let conflict = records.values().any(|r| {
            r.token_type == record.token_type
                && r.token_fingerprint == record.token_fingerprint
                && r.is_live(now)
        });
        if conflict {
            return Err(AuthError::store(
                "live record with this fingerprint already exists",
            ));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn find_live_by_fingerprint(
        &self,
        fingerprint: &str,
        token_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|r| {
                r.token_type == token_type
                    && r.token_fingerprint == fingerprint
                    && r.is_live(now)
            })
            .cloned())
    }

    async fn revoke_by_fingerprint(
        &self,
        fingerprint: &str,
        token_type: &str,
    ) -> Result<bool, AuthError> {
        let mut records = self.records.write().await;
        let mut newly_applied = false;
        for record in records.values_mut() {
            if record.token_type == token_type
                && record.token_fingerprint == fingerprint
                && !record.revoked
            {
                record.revoke();
                newly_applied = true;
            }
        }
        Ok(newly_applied)
    }

    async fn revoke_by_id(
        &self,
        user_id: &str,
        token_id: &str,
        token_type: &str,
    ) -> Result<bool, AuthError> {
        let mut records = self.records.write().await;
        match records.get_mut(token_id) {
            Some(record)
                if record.user_id == user_id
                    && record.token_type == token_type
                    && !record.revoked =>
            {
                record.revoke();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(
        &self,
        user_id: &str,
        token_type: &str,
    ) -> Result<u64, AuthError> {
        let mut records = self.records.write().await;
        let mut count = 0u64;
        for record in records.values_mut() {
            if record.user_id == user_id && record.token_type == token_type && !record.revoked {
                record.revoke();
                count += 1;
            }
        }
        Ok(count)
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        token_type: &str,
        limit: usize,
        active_only: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshTokenRecord>, AuthError> {
        let records = self.records.read().await;
        let mut matching: Vec<RefreshTokenRecord> = records
            .values()
            .filter(|r| {
                r.user_id == user_id
                    && r.token_type == token_type
                    && (!active_only || r.is_live(now))
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn apply_update(
        &self,
        token_id: &str,
        token_type: &str,
        fields: HashMap<String, serde_json::Value>,
    ) -> Result<bool, AuthError> {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(token_id) else {
            return Ok(false);
        };
        if record.token_type != token_type {
            return Ok(false);
        }

        for (name, value) in fields {
            match name.as_str() {
                "expires_at" => {
                    let parsed = value
                        .as_str()
                        .and_then(|s| s.parse::<DateTime<Utc>>().ok())
                        .or_else(|| value.as_i64().and_then(|t| DateTime::from_timestamp(t, 0)));
                    match parsed {
                        Some(instant) => record.expires_at = instant,
                        None => {
                            return Err(AuthError::validation(
                                "expires_at must be an RFC 3339 string or epoch seconds",
                            ))
                        }
                    }
                }
                "ip_address" => {
                    record.metadata.ip_address = value.as_str().map(str::to_string);
                }
                "user_agent" => {
                    record.metadata.user_agent = value.as_str().map(str::to_string);
                }
                _ => {
                    record.metadata.extra.insert(name, value);
                }
            }
        }
        Ok(true)
    }

    async fn delete_expired_before(
        &self,
        token_type: &str,
        horizon: DateTime<Utc>,
    ) -> Result<u64, AuthError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !(r.token_type == token_type && r.expires_at < horizon));
        Ok((before - records.len()) as u64)
    }
}

/// Cap on cache entries before expired ones are purged.
const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// In-memory TTL cache.
///
/// Expired entries are purged whenever an insert pushes the map past its
/// capacity, so long-lived hosts do not accumulate dead entries.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (Vec<u8>, Instant)>>,
    capacity: usize,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl MemoryCache {
    /// Create an empty cache with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that purges expired entries once it holds more than
    /// `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Number of entries currently held, counting expired ones not yet
    /// purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl TokenCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AuthError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).and_then(|(value, deadline)| {
            if Instant::now() < *deadline {
                Some(value.clone())
            } else {
                None
            }
        }))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), AuthError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (value.to_vec(), Instant::now() + ttl));

        // Evict if over size limit
        if entries.len() > self.capacity {
            let now = Instant::now();
            entries.retain(|_, (_, deadline)| *deadline > now);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresh::record::TokenMetadata;
    use chrono::Duration as ChronoDuration;

    fn record(user: &str, fingerprint: &str, token_type: &str) -> RefreshTokenRecord {
        RefreshTokenRecord::new(
            user.to_string(),
            fingerprint.to_string(),
            token_type.to_string(),
            Utc::now() + ChronoDuration::hours(1),
            TokenMetadata::default(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryRecordStore::new();
        store.insert(record("user-1", "fp-1", "oauth")).await.unwrap();

        let found = store
            .find_live_by_fingerprint("fp-1", "oauth", Utc::now())
            .await
            .unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().user_id, "user-1");
    }

    #[tokio::test]
    async fn test_fingerprint_is_partitioned_by_token_type() {
        let store = MemoryRecordStore::new();
        store.insert(record("user-1", "fp-1", "oauth")).await.unwrap();
        store.insert(record("user-1", "fp-1", "session")).await.unwrap();

        assert!(store
            .find_live_by_fingerprint("fp-1", "session", Utc::now())
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_live_by_fingerprint("fp-1", "saml", Utc::now())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_live_fingerprint_conflict_rejected() {
        let store = MemoryRecordStore::new();
        store.insert(record("user-1", "fp-1", "oauth")).await.unwrap();
        assert!(store.insert(record("user-2", "fp-1", "oauth")).await.is_err());
    }

    #[tokio::test]
    async fn test_revoke_reports_newly_applied_once() {
        let store = MemoryRecordStore::new();
        store.insert(record("user-1", "fp-1", "oauth")).await.unwrap();

        assert!(store.revoke_by_fingerprint("fp-1", "oauth").await.unwrap());
        assert!(!store.revoke_by_fingerprint("fp-1", "oauth").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let store = MemoryRecordStore::new();
        for i in 0..5 {
            let mut r = record("user-1", &format!("fp-{}", i), "oauth");
            r.created_at = Utc::now() + ChronoDuration::seconds(i);
            store.insert(r).await.unwrap();
        }

        let listed = store
            .list_for_user("user-1", "oauth", 3, false, Utc::now())
            .await
            .unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed[0].created_at >= listed[1].created_at);
        assert!(listed[1].created_at >= listed[2].created_at);
    }

    #[tokio::test]
    async fn test_delete_expired_before_spares_live_records() {
        let store = MemoryRecordStore::new();
        let mut old = record("user-1", "fp-old", "oauth");
        old.expires_at = Utc::now() - ChronoDuration::days(10);
        store.insert(old).await.unwrap();
        store.insert(record("user-1", "fp-live", "oauth")).await.unwrap();

        let horizon = Utc::now() - ChronoDuration::days(7);
        assert_eq!(store.delete_expired_before("oauth", horizon).await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_cache_ttl() {
        let cache = MemoryCache::new();
        cache.set("key", b"value", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), Some(b"value".to_vec()));

        cache.set("gone", b"value", Duration::from_millis(0)).await.unwrap();
        assert_eq!(cache.get("gone").await.unwrap(), None);

        cache.delete("key").await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cache_purges_expired_entries_over_capacity() {
        let cache = MemoryCache::with_capacity(2);
        cache.set("stale-1", b"v", Duration::from_millis(0)).await.unwrap();
        cache.set("stale-2", b"v", Duration::from_millis(0)).await.unwrap();
        assert_eq!(cache.len().await, 2);

        // The insert that crosses capacity drops the expired entries.
        cache.set("live", b"v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("live").await.unwrap(), Some(b"v".to_vec()));
    }
}
