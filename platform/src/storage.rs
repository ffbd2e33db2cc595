//! Object-storage port: upload bytes, get back a URL. The object-storage
//! SDK itself is out of scope; [`InMemoryObjectStore`] is what services run
//! against by default, same shape as [`crate::cache::CachePort`] and
//! [`crate::events::EventPublisher`].

use std::sync::atomic::{AtomicU64, Ordering};

pub trait ObjectStoragePort: Send + Sync {
    fn upload(
        &self,
        key_hint: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> impl std::future::Future<Output = String> + Send;
}

/// Captures nothing but a monotonically increasing counter; returns a
/// deterministic, collision-free URL without persisting the bytes anywhere.
#[derive(Default)]
pub struct InMemoryObjectStore {
    counter: AtomicU64,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectStoragePort for InMemoryObjectStore {
    async fn upload(&self, key_hint: &str, content_type: &str, data: Vec<u8>) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let ext = content_type.split('/').last().unwrap_or("bin");
        tracing::info!(key_hint, content_type, bytes = data.len(), "stored photo upload");
        format!("https://static.marketplace.example/{key_hint}/{n}.{ext}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_returns_distinct_urls_for_successive_calls() {
        let store = InMemoryObjectStore::new();
        let a = store.upload("listing-1", "image/png", vec![1, 2, 3]).await;
        let b = store.upload("listing-1", "image/png", vec![4, 5, 6]).await;
        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
    }
}
