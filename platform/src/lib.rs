//! The request-path plane shared by every marketplace service: token
//! verification, cache-aside, event publication, repository ports,
//! interceptor chain, RPC/HTTP server runtime, status mapping, error
//! taxonomy, observability, and config loading.

pub mod auth;
pub mod build_utils;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod grpc;
pub mod http;
pub mod ids;
pub mod moderation;
pub mod observability;
pub mod repository;
pub mod server;
pub mod storage;
pub mod time;
