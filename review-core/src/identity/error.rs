//! Identity error types

use thiserror::Error;

/// Result type alias for identity operations
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors from the durable key-value mirror
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(String),

    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Errors that can occur while allocating or restoring a case identity
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Remote generation failed or returned an unusable payload.
    /// The caller should fall back to manual entry.
    #[error("Case id allocation failed: {message}")]
    AllocationFailure { message: String },

    /// A supplied identifier is not acceptable
    #[error("Invalid case identity {value:?}: {reason}")]
    InvalidIdentity { value: String, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IdentityError {
    pub fn allocation(message: impl Into<String>) -> Self {
        Self::AllocationFailure {
            message: message.into(),
        }
    }

    pub fn invalid(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentity {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn is_allocation_failure(&self) -> bool {
        matches!(self, Self::AllocationFailure { .. })
    }
}
