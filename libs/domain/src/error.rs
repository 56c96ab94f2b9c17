//! Domain error types.

// ============================================================================
// Store Errors
// ============================================================================

/// Failure inside a backing store or queue.
///
/// Port implementations flatten their driver-specific errors into this one
/// opaque type so domain code never depends on a particular database crate.
#[derive(Debug, Clone, thiserror::Error)]
#[error("backing store error: {0}")]
pub struct StoreError(String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// ============================================================================
// Domain Errors
// ============================================================================

/// Client-facing outcome of a domain operation.
///
/// Each variant maps to one HTTP status at the API boundary. Variants that
/// relate to a specific request field or URL parameter carry its name so the
/// response can point at it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    /// The referenced resource does not exist (or is hidden from the caller).
    #[error("{message}")]
    NotFound {
        parameter: &'static str,
        message: String,
    },

    /// The caller is not allowed to perform the operation.
    #[error("{0}")]
    Forbidden(String),

    /// The request conflicts with the current state of the resource.
    #[error("{message}")]
    Conflict {
        field: &'static str,
        message: String,
    },

    /// The request is well-formed but semantically invalid.
    #[error("{message}")]
    Unprocessable {
        field: &'static str,
        message: String,
    },

    /// A backing store failed; nothing the client can fix.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    pub fn not_found(parameter: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            parameter,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(field: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            field,
            message: message.into(),
        }
    }

    pub fn unprocessable(field: &'static str, message: impl Into<String>) -> Self {
        Self::Unprocessable {
            field,
            message: message.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_displays_message() {
        let err = StoreError::new("connection reset");
        assert_eq!(err.to_string(), "backing store error: connection reset");
    }

    #[test]
    fn domain_error_wraps_store_error() {
        let err: DomainError = StoreError::new("timeout").into();
        assert!(matches!(err, DomainError::Store(_)));
        assert_eq!(err.to_string(), "backing store error: timeout");
    }

    #[test]
    fn not_found_carries_parameter() {
        let err = DomainError::not_found("track_id", "track not found: 42");
        match err {
            DomainError::NotFound { parameter, message } => {
                assert_eq!(parameter, "track_id");
                assert_eq!(message, "track not found: 42");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
