//! Tracing init and atomic request counters. OpenTelemetry exporter wiring
//! is out of scope; this wires `tracing-subscriber` JSON output only.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing_subscriber::EnvFilter;

pub fn init_tracing(service_name: &str, log_level: &str) {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(service = service_name, "tracing initialized");
}

/// Atomic counters for RPCs served, cache hit/miss, events published. No
/// locking: every handler increments on its own hot path.
#[derive(Default)]
pub struct Metrics {
    pub rpcs_served: AtomicU64,
    pub rpcs_failed: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub events_published: AtomicU64,
    pub events_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_rpc(&self, ok: bool) {
        if ok {
            self.rpcs_served.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rpcs_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_cache(&self, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_event(&self, ok: bool) {
        if ok {
            self.events_published.fetch_add(1, Ordering::Relaxed);
        } else {
            self.events_failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_independently() {
        let metrics = Metrics::new();
        metrics.record_rpc(true);
        metrics.record_rpc(false);
        metrics.record_cache(true);
        assert_eq!(metrics.rpcs_served.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.rpcs_failed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.cache_hits.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.cache_misses.load(Ordering::Relaxed), 0);
    }
}
