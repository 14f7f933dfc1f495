//! Domain model for calendar slots and their tradability.
//!
//! A slot moves between `Busy` and `Tradable` at its owner's request and is
//! locked into `PendingSwap` only by a swap negotiation. All transitions are
//! typed methods on [`Slot`] that validate the current status first.

mod error;
mod ids;
mod slot;
mod status;
mod window;

pub use error::{ParseSlotStatusError, SlotDomainError};
pub use ids::{SlotId, SlotRevision, SwapLock, UserId};
pub use slot::{PersistedSlotData, Slot};
pub use status::SlotStatus;
pub use window::{SlotTitle, TimeWindow};
