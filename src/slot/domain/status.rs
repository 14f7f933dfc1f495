//! Slot tradability status.

use super::ParseSlotStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tradability status of a calendar slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    /// The slot is occupied and not offered for trading.
    Busy,
    /// The slot is available for swap proposals.
    Tradable,
    /// The slot is locked inside an unresolved swap negotiation.
    PendingSwap,
}

impl SlotStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Busy => "busy",
            Self::Tradable => "tradable",
            Self::PendingSwap => "pending_swap",
        }
    }

    /// Returns whether the owner may edit or delete a slot in this status.
    #[must_use]
    pub const fn is_owner_editable(self) -> bool {
        !matches!(self, Self::PendingSwap)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SlotStatus {
    type Error = ParseSlotStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "busy" => Ok(Self::Busy),
            "tradable" => Ok(Self::Tradable),
            "pending_swap" => Ok(Self::PendingSwap),
            _ => Err(ParseSlotStatusError(value.to_owned())),
        }
    }
}
