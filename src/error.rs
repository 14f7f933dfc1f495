//! Stable error categories shared by the slot and swap services.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-facing category of a service failure.
///
/// Service error enums carry detailed context; this category is the stable
/// signal an API layer maps onto user messages or status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A referenced slot or negotiation does not exist.
    NotFound,
    /// The caller lacks authorization over the resource.
    Forbidden,
    /// The input is malformed or self-referential.
    InvalidRequest,
    /// The resource is not in the state the operation requires.
    InvalidTransition,
    /// The backing store failed.
    Persistence,
}

impl ErrorKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::InvalidRequest => "invalid_request",
            Self::InvalidTransition => "invalid_transition",
            Self::Persistence => "persistence",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
