//! Identifier types for the swap domain.

use crate::slot::domain::SwapLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a swap negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NegotiationId(Uuid);

impl NegotiationId {
    /// Creates a new random negotiation identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a negotiation identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }

    /// Returns the lock token slots carry while held by this negotiation.
    #[must_use]
    pub const fn swap_lock(self) -> SwapLock {
        SwapLock::from_uuid(self.0)
    }
}

impl Default for NegotiationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NegotiationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
