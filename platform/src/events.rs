//! Event publication port: best-effort, after the authoritative store
//! write. Consumers must tolerate at-least-once, out-of-order delivery.

use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

pub trait EventPublisher: Send + Sync {
    fn publish_json<T: Serialize + Send + Sync>(
        &self,
        subject: &str,
        payload: &T,
    ) -> impl std::future::Future<Output = ()> + Send;
}

/// Captures published payloads for assertions in domain-service tests.
#[derive(Default)]
pub struct InMemoryEventPublisher {
    published: Mutex<Vec<(String, String)>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn count_for(&self, subject: &str) -> usize {
        self.published.lock().unwrap().iter().filter(|(s, _)| s == subject).count()
    }
}

impl EventPublisher for InMemoryEventPublisher {
    async fn publish_json<T: Serialize + Send + Sync>(&self, subject: &str, payload: &T) {
        match serde_json::to_string(payload) {
            Ok(json) => self.published.lock().unwrap().push((subject.to_string(), json)),
            Err(e) => tracing::warn!(error = %e, subject, "failed to serialize event payload"),
        }
    }
}

/// NATS-backed adapter. The message-bus client library itself is out of
/// scope; this is the narrow interface a deployment plugs a real client
/// behind.
pub struct NatsEventPublisher {
    client: async_nats::Client,
}

impl NatsEventPublisher {
    pub async fn connect(url: &str, max_retries: u32) -> anyhow::Result<Self> {
        let mut attempt = 0;
        loop {
            match async_nats::connect(url).await {
                Ok(client) => {
                    tracing::info!("connected to event bus");
                    return Ok(Self { client });
                }
                Err(e) if attempt < max_retries => {
                    let backoff = Duration::from_millis(200 * 2u64.pow(attempt));
                    tracing::warn!(error = %e, attempt, "event bus connection failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl EventPublisher for NatsEventPublisher {
    async fn publish_json<T: Serialize + Send + Sync>(&self, subject: &str, payload: &T) {
        let bytes = match serde_json::to_vec(payload) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, subject, "failed to serialize event payload");
                return;
            }
        };
        if let Err(e) = self.client.publish(subject.to_string(), bytes.into()).await {
            tracing::warn!(error = %e, subject, "event publish failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct ReviewCreated {
        review_id: String,
    }

    #[tokio::test]
    async fn in_memory_publisher_captures_payloads() {
        let publisher = InMemoryEventPublisher::new();
        publisher
            .publish_json("review.created", &ReviewCreated { review_id: "r1".into() })
            .await;
        assert_eq!(publisher.count_for("review.created"), 1);
        assert_eq!(publisher.count_for("review.deleted"), 0);
    }
}
