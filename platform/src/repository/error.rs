//! Structured repository error shape, kept close to the original
//! operation+kind+message+entity split so domain services can translate it
//! without re-deriving context.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryOperation {
    FindById,
    FindAll,
    Count,
    Exists,
    Create,
    Update,
    Delete,
    Transaction,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepositoryOperation::FindById => "find_by_id",
            RepositoryOperation::FindAll => "find_all",
            RepositoryOperation::Count => "count",
            RepositoryOperation::Exists => "exists",
            RepositoryOperation::Create => "create",
            RepositoryOperation::Update => "update",
            RepositoryOperation::Delete => "delete",
            RepositoryOperation::Transaction => "transaction",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryErrorKind {
    NotFound,
    AlreadyExists,
    OptimisticLock,
    ConstraintViolation,
    ValidationFailed,
    ConnectionFailed,
    Timeout,
    DatabaseError,
    SerializationError,
    Other,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{operation} on {entity_type} failed: {message}")]
pub struct RepositoryError {
    pub operation: RepositoryOperation,
    pub kind: RepositoryErrorKind,
    pub message: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
}

impl RepositoryError {
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        entity_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: entity_type.into(),
            entity_id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(
            RepositoryOperation::FindById,
            RepositoryErrorKind::NotFound,
            entity_type,
            format!("no such entity with id {id}"),
        )
        .with_id(id)
    }

    pub fn already_exists(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Create,
            RepositoryErrorKind::AlreadyExists,
            entity_type,
            message,
        )
    }

    pub fn optimistic_lock(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new(
            RepositoryOperation::Update,
            RepositoryErrorKind::OptimisticLock,
            entity_type,
            "version mismatch",
        )
        .with_id(id)
    }

    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }
}
