//! # Clock and Extension Gate
//!
//! The clock is the read-only context every write and export consults:
//! - the current step (monotonically non-decreasing)
//! - the enabled GEXF extensions
//! - the time format used to render interval bounds
//!
//! The engine never reaches for a global clock. Writers receive `&impl Clock`
//! and exporters work from a `ClockSnapshot` taken once per pass.

use crate::formats::TimeFormat;
use crate::{DynexError, Step};
use serde::{Deserialize, Serialize};

// =============================================================================
// EXTENSIONS
// =============================================================================

/// GEXF extensions a graph can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Extension {
    /// Visualization attributes (color, position, size).
    Viz,
    /// Time semantics: `start`/`end` bounds on elements and values.
    Dynamics,
    /// Phylogenetic trees.
    Phylogenics,
    /// Attribute declarations and values.
    Data,
}

impl Extension {
    const fn bit(self) -> u8 {
        match self {
            Self::Viz => 1,
            Self::Dynamics => 1 << 1,
            Self::Phylogenics => 1 << 2,
            Self::Data => 1 << 3,
        }
    }
}

/// A set of enabled extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtensionSet(u8);

impl ExtensionSet {
    /// The empty set: a static graph with no extensions.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Enable an extension.
    pub fn insert(&mut self, ext: Extension) {
        self.0 |= ext.bit();
    }

    /// Disable an extension.
    pub fn remove(&mut self, ext: Extension) {
        self.0 &= !ext.bit();
    }

    /// Check whether an extension is enabled.
    #[must_use]
    pub const fn contains(self, ext: Extension) -> bool {
        self.0 & ext.bit() != 0
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, ext: Extension) -> Self {
        self.insert(ext);
        self
    }
}

// =============================================================================
// CLOCK TRAIT
// =============================================================================

/// Read-only view of a graph's time context.
pub trait Clock {
    /// The graph's current step.
    fn current_step(&self) -> Step;

    /// Whether an extension is enabled.
    fn is_extension_enabled(&self, ext: Extension) -> bool;

    /// How steps are rendered on export.
    fn time_format(&self) -> TimeFormat;

    /// Freeze the current state into a copyable snapshot.
    fn snapshot(&self) -> ClockSnapshot {
        let mut extensions = ExtensionSet::empty();
        for ext in [
            Extension::Viz,
            Extension::Dynamics,
            Extension::Phylogenics,
            Extension::Data,
        ] {
            if self.is_extension_enabled(ext) {
                extensions.insert(ext);
            }
        }
        ClockSnapshot {
            step: self.current_step(),
            extensions,
            time_format: self.time_format(),
        }
    }
}

/// A frozen clock state, taken once per export pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockSnapshot {
    pub step: Step,
    pub extensions: ExtensionSet,
    pub time_format: TimeFormat,
}

impl Clock for ClockSnapshot {
    fn current_step(&self) -> Step {
        self.step
    }

    fn is_extension_enabled(&self, ext: Extension) -> bool {
        self.extensions.contains(ext)
    }

    fn time_format(&self) -> TimeFormat {
        self.time_format
    }

    fn snapshot(&self) -> ClockSnapshot {
        *self
    }
}

// =============================================================================
// GRAPH CLOCK
// =============================================================================

/// The mutable clock owned by a graph session.
///
/// Starts at step 0 with no extensions and the `Double` time format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphClock {
    step: Step,
    extensions: ExtensionSet,
    time_format: TimeFormat,
}

impl GraphClock {
    /// Create a static clock at step 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock with the dynamics extension enabled.
    #[must_use]
    pub fn dynamic() -> Self {
        Self {
            extensions: ExtensionSet::empty().with(Extension::Dynamics),
            ..Self::default()
        }
    }

    /// Builder-style time format override.
    #[must_use]
    pub fn with_time_format(mut self, format: TimeFormat) -> Self {
        self.time_format = format;
        self
    }

    /// Move the clock forward.
    ///
    /// Staying on the current step is allowed; moving backwards is not.
    pub fn advance_to(&mut self, step: Step) -> Result<(), DynexError> {
        if !step.is_finite() {
            return Err(DynexError::InvalidStep(step.value()));
        }
        if step < self.step {
            return Err(DynexError::NonMonotonicStep {
                current: self.step,
                requested: step,
            });
        }
        self.step = step;
        Ok(())
    }

    /// Enable an extension.
    ///
    /// Turning on `Dynamics` upgrades a static graph; records created before
    /// the upgrade export with bounds from then on.
    pub fn enable(&mut self, ext: Extension) {
        self.extensions.insert(ext);
    }

    /// Disable an extension.
    pub fn disable(&mut self, ext: Extension) {
        self.extensions.remove(ext);
    }

    /// Change the time format.
    pub fn set_time_format(&mut self, format: TimeFormat) {
        self.time_format = format;
    }

    /// The enabled extensions.
    #[must_use]
    pub fn extensions(&self) -> ExtensionSet {
        self.extensions
    }
}

impl Clock for GraphClock {
    fn current_step(&self) -> Step {
        self.step
    }

    fn is_extension_enabled(&self, ext: Extension) -> bool {
        self.extensions.contains(ext)
    }

    fn time_format(&self) -> TimeFormat {
        self.time_format
    }
}

// =============================================================================
// TESTS
// =============================================================================
