//! Service layer for swap negotiation orchestration.

mod negotiator;

pub use negotiator::{
    ProposeSwapRequest, ResolveSwapRequest, SwapNegotiationError, SwapNegotiationResult,
    SwapNegotiator,
};
