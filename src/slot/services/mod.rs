//! Application services for slot ownership and tradability.

mod registry;

pub use registry::{
    CreateSlotRequest, SlotRegistryError, SlotRegistryResult, SlotRegistryService,
    UpdateSlotDetailsRequest,
};
