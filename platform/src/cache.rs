//! Cache-aside port: get/set/delete with TTL, `NotFound` a first-class
//! outcome rather than an error. The real key-value store driver is out of
//! scope; [`RedisCachePort`] is a thin adapter behind the same trait, and
//! [`InMemoryCachePort`] is what services run against by default.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

pub trait CachePort: Send + Sync {
    fn get_raw(&self, key: &str) -> impl std::future::Future<Output = Option<String>> + Send;
    fn set_raw(&self, key: &str, value: String, ttl: Duration) -> impl std::future::Future<Output = ()> + Send;
    fn delete(&self, key: &str) -> impl std::future::Future<Output = ()> + Send;
}

/// DashMap would do, but expiry needs an explicit instant per entry; a
/// mutex-guarded map keeps that bookkeeping in one place.
#[derive(Default)]
pub struct InMemoryCachePort {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryCachePort {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CachePort for InMemoryCachePort {
    async fn get_raw(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Duration) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value, Instant::now() + ttl));
    }

    async fn delete(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }
}

/// Redis-backed adapter. Connection failures are logged and treated as a
/// cache miss by [`cache_aside`]; they never fail the caller's request.
pub struct RedisCachePort {
    pool: deadpool_redis::Pool,
}

impl RedisCachePort {
    /// Builds a connection pool with exponential-backoff retries, the same
    /// shape the repository/event ports use to come up against a
    /// not-yet-ready dependency during rolling restarts.
    pub async fn connect(redis_url: &str, max_retries: u32) -> anyhow::Result<Self> {
        let cfg = deadpool_redis::Config::from_url(redis_url);
        let pool = cfg.create_pool(Some(deadpool_redis::Runtime::Tokio1))?;

        let mut attempt = 0;
        loop {
            match pool.get().await {
                Ok(_) => {
                    tracing::info!("connected to redis cache");
                    return Ok(Self { pool });
                }
                Err(e) if attempt < max_retries => {
                    let backoff = Duration::from_millis(200 * 2u64.pow(attempt));
                    tracing::warn!(error = %e, attempt, "redis connection failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl CachePort for RedisCachePort {
    async fn get_raw(&self, key: &str) -> Option<String> {
        use deadpool_redis::redis::AsyncCommands;
        let mut conn = match self.pool.get().await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "cache get: pool exhausted");
                return None;
            }
        };
        match conn.get::<_, Option<String>>(key).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, key, "cache get failed");
                None
            }
        }
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Duration) {
        use deadpool_redis::redis::AsyncCommands;
        let mut conn = match self.pool.get().await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "cache set: pool exhausted");
                return;
            }
        };
        if let Err(e) = conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await {
            tracing::warn!(error = %e, key, "cache set failed");
        }
    }

    async fn delete(&self, key: &str) {
        use deadpool_redis::redis::AsyncCommands;
        let mut conn = match self.pool.get().await {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "cache delete: pool exhausted");
                return;
            }
        };
        if let Err(e) = conn.del::<_, ()>(key).await {
            tracing::warn!(error = %e, key, "cache delete failed");
        }
    }
}

/// The cache-aside read path: hit returns immediately, miss falls through
/// to `load` and writes back with `ttl`. A corrupted (non-deserializable)
/// cached value is deleted and treated as a miss.
pub async fn cache_aside<C, T, F, Fut, E>(cache: &C, key: &str, ttl: Duration, load: F) -> Result<T, E>
where
    C: CachePort,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    if let Some(raw) = cache.get_raw(key).await {
        match serde_json::from_str::<T>(&raw) {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(error = %e, key, "corrupted cache value, treating as miss");
                cache.delete(key).await;
            }
        }
    }

    let value = load().await?;
    if let Ok(serialized) = serde_json::to_string(&value) {
        cache.set_raw(key, serialized, ttl).await;
    }
    Ok(value)
}

pub fn entity_key(entity: &str, id: &str) -> String {
    format!("{entity}:{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq)]
    struct Widget {
        id: String,
        name: String,
    }

    #[tokio::test]
    async fn cache_aside_loads_on_miss_then_hits() {
        let cache = InMemoryCachePort::new();
        let mut loads = 0;
        let key = entity_key("widget", "1");

        let first: Widget = cache_aside(&cache, &key, DEFAULT_TTL, || async {
            loads += 1;
            Ok::<_, std::convert::Infallible>(Widget { id: "1".into(), name: "a".into() })
        })
        .await
        .unwrap();
        assert_eq!(first.name, "a");
        assert_eq!(loads, 1);

        let second: Widget = cache_aside(&cache, &key, DEFAULT_TTL, || async {
            loads += 1;
            Ok::<_, std::convert::Infallible>(Widget { id: "1".into(), name: "b".into() })
        })
        .await
        .unwrap();
        // second load function never runs: served from cache
        assert_eq!(second.name, "a");
        assert_eq!(loads, 1);
    }

    #[tokio::test]
    async fn delete_invalidates_entry() {
        let cache = InMemoryCachePort::new();
        cache.set_raw("k", "\"v\"".to_string(), DEFAULT_TTL).await;
        cache.delete("k").await;
        assert_eq!(cache.get_raw("k").await, None);
    }

    #[tokio::test]
    async fn corrupted_value_is_treated_as_miss() {
        let cache = InMemoryCachePort::new();
        cache.set_raw("k", "not valid json for a Widget".to_string(), DEFAULT_TTL).await;
        let value: Widget = cache_aside(&cache, "k", DEFAULT_TTL, || async {
            Ok::<_, std::convert::Infallible>(Widget { id: "1".into(), name: "fresh".into() })
        })
        .await
        .unwrap();
        assert_eq!(value.name, "fresh");
    }
}
