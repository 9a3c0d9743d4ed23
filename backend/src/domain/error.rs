//! Domain-level error taxonomy.
//!
//! These errors are transport agnostic. The consuming HTTP layer maps them to
//! status codes and response envelopes; nothing in the core retries them.

use thiserror::Error;

/// Failure categories surfaced by domain services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The input is malformed or out of range.
    #[error("{message}")]
    Validation { message: String },

    /// The referenced record does not exist, or the caller may not see it.
    #[error("{message}")]
    NotFound { message: String },

    /// Role or category checks rejected a write.
    #[error("{message}")]
    PermissionDenied { message: String },

    /// The operation conflicts with existing state.
    #[error("{message}")]
    Conflict { message: String },

    /// The storage backend could not be reached.
    #[error("{message}")]
    Unavailable { message: String },

    /// An unexpected failure inside the domain or its adapters.
    #[error("{message}")]
    Internal { message: String },
}

impl DomainError {
    /// Convenience constructor for [`DomainError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`DomainError::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`DomainError::PermissionDenied`].
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`DomainError::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`DomainError::Unavailable`].
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`DomainError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Convenient result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_constructors_produce_matching_variants() {
        assert!(matches!(
            DomainError::validation("bad input"),
            DomainError::Validation { .. }
        ));
        assert!(matches!(
            DomainError::permission_denied("nope"),
            DomainError::PermissionDenied { .. }
        ));
    }

    #[test]
    fn display_surfaces_the_message() {
        let err = DomainError::not_found("item 7 not found");
        assert_eq!(err.to_string(), "item 7 not found");
    }
}
