//! # Core Type Definitions
//!
//! This module contains the value types shared by every Dynex component:
//! - Time axis coordinate (`Step`)
//! - Record keys and payloads (`OwnerId`, `AttValue`)
//! - Error types (`DynexError`)
//!
//! ## Step Guarantees
//!
//! A `Step` is always finite. NaN is never used as an "open" marker inside
//! the engine; an open interval end is `None` instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// STEP
// =============================================================================

/// A coordinate on the graph's time axis.
///
/// Steps are real-valued and finite. The clock only ever moves forward, so
/// steps observed through a clock are monotonically non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Step(f64);

impl Step {
    /// The origin of the time axis.
    pub const ZERO: Step = Step(0.0);

    /// Create a step, rejecting NaN and infinities.
    ///
    /// `-0.0` is stored as `0.0`.
    pub fn new(value: f64) -> Result<Self, DynexError> {
        if value == 0.0 {
            Ok(Self::ZERO)
        } else if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(DynexError::InvalidStep(value))
        }
    }

    /// Get the raw step value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns true if the step holds a finite value.
    ///
    /// Only steps decoded from untrusted bytes can fail this check.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl TryFrom<f64> for Step {
    type Error = DynexError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// =============================================================================
// RECORD KEY & PAYLOAD
// =============================================================================

/// Identifier of the graph element and attribute a value applies to.
///
/// The key is opaque to the engine; it is emitted verbatim as the `for`
/// attribute of each exported element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl OwnerId {
    /// Create a new owner id from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the owner id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The pre-rendered payload of one attribute version.
///
/// Typed values are rendered once, at construction, into the textual form
/// GEXF expects. The engine never looks inside the string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttValue(pub String);

impl AttValue {
    /// Create a new value from an already rendered string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AttValue {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AttValue {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<bool> for AttValue {
    fn from(b: bool) -> Self {
        Self(if b { "true" } else { "false" }.to_string())
    }
}

impl From<i64> for AttValue {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl From<f64> for AttValue {
    /// Shortest round-trip rendering, always carrying a decimal part for
    /// integral values (`5.0`, not `5`).
    fn from(x: f64) -> Self {
        Self(format!("{:?}", x))
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Dynex engine.
///
/// - No silent failures
/// - Use `Result<T, DynexError>` for fallible operations
/// - Interval errors are caller sequencing bugs and are never retried
#[derive(Debug, Error)]
pub enum DynexError {
    /// A close targeted an already-closed record, or an end before its start.
    #[error("Invalid interval for '{owner}': cannot close at {requested} (start {start}, end {end:?})")]
    InvalidInterval {
        owner: OwnerId,
        start: Step,
        end: Option<Step>,
        requested: Step,
    },

    /// A step value was NaN or infinite.
    #[error("Invalid step: {0}")]
    InvalidStep(f64),

    /// The clock was asked to move backwards.
    #[error("Non-monotonic step: clock is at {current}, requested {requested}")]
    NonMonotonicStep { current: Step, requested: Step },

    /// The output sink could not accept a write.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// A configuration value could not be parsed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
