//! Error taxonomy shared by the services and the adapters.

use thiserror::Error;

/// Result type used across the domain and service layers.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Inventory error.
///
/// Every variant carries a human-readable message. Adapters translate the
/// variant into a status code or exit code; the message never contains query
/// text or other storage internals.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Malformed or out-of-range input (non-positive quantity, empty name, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced product, location or stock pair does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A business key (SKU, location name) is already registered.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The operation is valid but the current state forbids it (insufficient stock).
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// The caller's deadline elapsed before the operation completed.
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Store connectivity or any other unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl InventoryError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::FailedPrecondition(msg.into())
    }

    pub fn deadline_exceeded(msg: impl Into<String>) -> Self {
        Self::DeadlineExceeded(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable, machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::FailedPrecondition(_) => "failed_precondition",
            Self::DeadlineExceeded(_) => "deadline_exceeded",
            Self::Internal(_) => "internal",
        }
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(m)
            | Self::NotFound(m)
            | Self::AlreadyExists(m)
            | Self::FailedPrecondition(m)
            | Self::DeadlineExceeded(m)
            | Self::Internal(m) => m,
        }
    }
}
