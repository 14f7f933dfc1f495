//! In-memory adapters for slot persistence.

mod repository;

pub use repository::InMemorySlotRepository;
