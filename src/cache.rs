use crate::error::{AppError, AppResult};
use moka::future::Cache;
use moka::Expiry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A serialized result set plus the TTL it was stored with.
#[derive(Debug, Clone)]
struct CachedPayload {
    json: Arc<str>,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, CachedPayload> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedPayload,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Response cache keyed on `"{operation}:{normalized query}"`.
/// Stores serialized JSON with a per-entry TTL.
///
/// Concurrent misses for one key share a single producer run, and a failed
/// producer leaves nothing behind.
pub struct ResponseCache {
    inner: Cache<String, CachedPayload>,
}

impl ResponseCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Equivalent queries (case, surrounding whitespace) share one slot.
    pub fn cache_key(operation: &str, query: &str) -> String {
        format!("{}:{}", operation, query.trim().to_lowercase())
    }

    /// Platform ids are case-sensitive and used verbatim.
    pub fn resource_key(operation: &str, id: &str) -> String {
        format!("{operation}:{id}")
    }

    pub async fn get_or_compute<T, Fut>(&self, key: String, ttl: Duration, producer: Fut) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        Fut: Future<Output = AppResult<T>>,
    {
        let computed = AtomicBool::new(false);
        let init = async {
            computed.store(true, Ordering::Relaxed);
            let value = producer.await?;
            let json = serde_json::to_string(&value)
                .map_err(|e| AppError::Internal(format!("serialize cache entry: {e}")))?;
            Ok::<_, AppError>(CachedPayload {
                json: Arc::from(json),
                ttl,
            })
        };

        let payload = self
            .inner
            .try_get_with(key.clone(), init)
            .await
            .map_err(Arc::unwrap_or_clone)?;

        if computed.load(Ordering::Relaxed) {
            tracing::debug!(key = %key, ttl_secs = ttl.as_secs(), "cache miss");
        } else {
            tracing::debug!(key = %key, "cache hit");
        }

        serde_json::from_str(&payload.json)
            .map_err(|e| AppError::Internal(format!("deserialize cache entry {key}: {e}")))
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
