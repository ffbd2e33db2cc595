//! gRPC health surface, backed by `tonic-health`'s standard health
//! protocol. `""` is the overall-server status; graceful shutdown flips it
//! to `NotServing` before draining in-flight calls.

use tonic::service::Routes;
use tonic_health::server::HealthReporter;
use tonic_health::ServingStatus;

#[derive(Clone)]
pub struct HealthState {
    reporter: HealthReporter,
    server: Routes,
}

impl HealthState {
    pub fn new() -> Self {
        let (reporter, server) = tonic_health::server::health_reporter();
        Self { reporter, server: Routes::new(server) }
    }

    pub fn server(&self) -> Routes {
        self.server.clone()
    }

    pub async fn mark_serving(&self) {
        self.reporter.set_service_status("", ServingStatus::Serving).await;
    }

    pub async fn mark_not_serving(&self) {
        self.reporter.set_service_status("", ServingStatus::NotServing).await;
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}
