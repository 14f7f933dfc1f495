//! In-memory negotiation storage.

mod repository;

pub use repository::InMemoryNegotiationRepository;
