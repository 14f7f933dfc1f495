//! Unit tests for the slot registry.
