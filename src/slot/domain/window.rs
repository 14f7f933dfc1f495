//! Validated scalar values describing a slot.

use super::SlotDomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open time range `[start, end)` covered by a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a validated time window.
    ///
    /// # Errors
    ///
    /// Returns [`SlotDomainError::InvalidWindow`] unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SlotDomainError> {
        if start >= end {
            return Err(SlotDomainError::InvalidWindow);
        }
        Ok(Self { start, end })
    }

    /// Returns the inclusive start of the window.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the exclusive end of the window.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }
}

/// Human-readable slot title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotTitle(String);

impl SlotTitle {
    /// Creates a validated title, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`SlotDomainError::EmptyTitle`] when the trimmed value is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, SlotDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SlotDomainError::EmptyTitle);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SlotTitle {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SlotTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
