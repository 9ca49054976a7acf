//! # Attribute Version Records
//!
//! One record per `(owner, value)` assignment. A record starts open at the
//! step it was created and is closed exactly once, either when a newer write
//! to the same owner supersedes it or when it is sealed at export time.
//!
//! Records are plain value holders. The "one open record per owner" rule is
//! enforced by [`AttributeHistory`](crate::AttributeHistory), not here.

use crate::clock::Clock;
use crate::{AttValue, DynexError, OwnerId, Step};
use serde::{Deserialize, Serialize};

/// A closed validity interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: Step,
    pub end: Step,
}

impl Interval {
    /// Half-open membership test.
    #[must_use]
    pub fn contains(&self, step: Step) -> bool {
        self.start <= step && step < self.end
    }

    /// True if the interval covers no step at all (`start == end`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// One version of an attribute value.
///
/// `start` and `value` are fixed at construction. `end` is `None` while the
/// record is open and is assigned exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeVersionRecord {
    owner_id: OwnerId,
    value: AttValue,
    start: Step,
    end: Option<Step>,
}

impl AttributeVersionRecord {
    /// Create an open record starting at `start`.
    #[must_use]
    pub fn new(owner_id: OwnerId, value: AttValue, start: Step) -> Self {
        Self {
            owner_id,
            value,
            start,
            end: None,
        }
    }

    /// Create an open record stamped with the clock's current step.
    #[must_use]
    pub fn at_clock(owner_id: OwnerId, value: AttValue, clock: &impl Clock) -> Self {
        Self::new(owner_id, value, clock.current_step())
    }

    /// Check that the record could be closed at `at`, without closing it.
    pub fn check_close(&self, at: Step) -> Result<(), DynexError> {
        if self.end.is_some() || at < self.start || !at.is_finite() {
            return Err(DynexError::InvalidInterval {
                owner: self.owner_id.clone(),
                start: self.start,
                end: self.end,
                requested: at,
            });
        }
        Ok(())
    }

    /// Close the record at `at`.
    ///
    /// Fails with `InvalidInterval` if the record is already closed or if
    /// `at` lies before `start`. On failure the record is unchanged.
    pub fn close(&mut self, at: Step) -> Result<(), DynexError> {
        self.check_close(at)?;
        self.end = Some(at);
        Ok(())
    }

    /// True while no end has been assigned.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    #[must_use]
    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    #[must_use]
    pub fn value(&self) -> &AttValue {
        &self.value
    }

    #[must_use]
    pub fn start(&self) -> Step {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> Option<Step> {
        self.end
    }

    /// The closed interval, or `None` while open.
    #[must_use]
    pub fn interval(&self) -> Option<Interval> {
        self.end.map(|end| Interval {
            start: self.start,
            end,
        })
    }

    /// Whether this version held at `step`.
    ///
    /// An open record holds for every step from `start` onwards.
    #[must_use]
    pub fn is_active_at(&self, step: Step) -> bool {
        match self.interval() {
            Some(interval) => interval.contains(step),
            None => self.start <= step,
        }
    }

    /// Check the interval invariants of a record decoded from bytes.
    pub(crate) fn validate(&self) -> Result<(), DynexError> {
        if !self.start.is_finite() {
            return Err(DynexError::DeserializationError(format!(
                "Record for '{}' has a non-finite start",
                self.owner_id
            )));
        }
        if let Some(end) = self.end {
            if !end.is_finite() || end < self.start {
                return Err(DynexError::DeserializationError(format!(
                    "Record for '{}' ends at {} before its start {}",
                    self.owner_id, end, self.start
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
