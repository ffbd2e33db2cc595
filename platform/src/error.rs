//! Domain error taxonomy shared by every service.
//!
//! Three kinds flow through the stack: [`DomainError`] (produced by domain
//! services), [`crate::repository::RepositoryError`] (produced by repository
//! ports, translated into a `DomainError` at the domain boundary), and
//! `tonic::Status` (the canonical wire form, the single translation target
//! for a `DomainError` inside each service's gRPC handler).

use tonic::{Code, Status};

/// Errors produced by a domain service.
///
/// These carry human-readable messages and are classified rather than
/// chained opaquely as they cross the repository/domain boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("version conflict: {0}")]
    OptimisticLock(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(what: impl Into<String>) -> Self {
        Self::Forbidden(what.into())
    }

    pub fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidInput(what.into())
    }

    pub fn already_exists(what: impl Into<String>) -> Self {
        Self::AlreadyExists(what.into())
    }

    /// The RPC handler's single translation point from domain kind to
    /// transport status code.
    pub fn to_status(&self) -> Status {
        match self {
            DomainError::NotFound(msg) => Status::not_found(msg.clone()),
            DomainError::Forbidden(msg) => Status::permission_denied(msg.clone()),
            DomainError::InvalidInput(msg) => Status::invalid_argument(msg.clone()),
            DomainError::AlreadyExists(msg) => Status::already_exists(msg.clone()),
            DomainError::OptimisticLock(msg) => Status::aborted(msg.clone()),
            DomainError::Internal(msg) => Status::internal(msg.clone()),
        }
    }
}

impl From<DomainError> for Status {
    fn from(err: DomainError) -> Self {
        err.to_status()
    }
}

impl From<crate::repository::RepositoryError> for DomainError {
    fn from(err: crate::repository::RepositoryError) -> Self {
        use crate::repository::RepositoryErrorKind as K;
        match err.kind {
            K::NotFound => DomainError::NotFound(err.message),
            K::AlreadyExists => DomainError::AlreadyExists(err.message),
            K::OptimisticLock => DomainError::OptimisticLock(err.message),
            K::ValidationFailed | K::ConstraintViolation => DomainError::InvalidInput(err.message),
            K::ConnectionFailed | K::Timeout | K::DatabaseError | K::SerializationError | K::Other => {
                DomainError::Internal(err.message)
            }
        }
    }
}

/// Code a panic caught at the handler boundary surfaces as; panics never
/// escape a single request (handler-level recover).
pub fn panic_status() -> Status {
    Status::new(Code::Internal, "internal error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_maps_to_expected_status_code() {
        assert_eq!(DomainError::not_found("x").to_status().code(), Code::NotFound);
        assert_eq!(DomainError::forbidden("x").to_status().code(), Code::PermissionDenied);
        assert_eq!(DomainError::invalid("x").to_status().code(), Code::InvalidArgument);
        assert_eq!(DomainError::already_exists("x").to_status().code(), Code::AlreadyExists);
        assert_eq!(
            DomainError::OptimisticLock("x".into()).to_status().code(),
            Code::Aborted
        );
    }
}
