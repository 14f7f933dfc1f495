//! Port abstractions for swap negotiation persistence.

mod repository;

pub use repository::{NegotiationRepository, NegotiationRepositoryError, NegotiationRepositoryResult};
