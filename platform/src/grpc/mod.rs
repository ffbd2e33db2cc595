pub mod health;
pub mod interceptors;
pub mod server;

pub use health::HealthState;
pub use server::{shutdown_signal, GrpcServer, GrpcServicesBuilder};
