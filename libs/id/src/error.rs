//! ID parsing failures.

use thiserror::Error;

/// Why an ID string failed to parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("empty ID string")]
    Empty,

    /// No underscore between the prefix and the ULID.
    #[error("ID is missing its '_' separator")]
    MissingSeparator,

    /// The prefix names a different resource type.
    #[error("wrong ID prefix: expected '{expected}', found '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    /// The part after the underscore is not a ULID.
    #[error("bad ULID suffix: {0}")]
    InvalidUlid(String),
}
