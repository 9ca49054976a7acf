//! # Attvalue Export
//!
//! Serializes attribute version records into `attvalue` elements.
//!
//! For each record the exporter:
//! 1. Emits `for` and `value` verbatim.
//! 2. Seals an open record at the snapshot's current step.
//! 3. Emits `start` and `end` only when the dynamics extension is enabled.
//!
//! The static/dynamic decision is made once per pass by selecting an
//! [`ExportShape`]; the record type itself carries no notion of graph mode.
//!
//! ## Atomicity
//!
//! The element is rendered from the snapshot while the record is still
//! untouched. The record is sealed only after the sink accepted the element,
//! so a failed write leaves the record exactly as it was.

use crate::clock::{Clock, ClockSnapshot, Extension};
use crate::formats::TimeFormat;
use crate::primitives::{ATTR_END, ATTR_FOR, ATTR_START, ATTR_VALUE, ATTVALUE_ELEMENT};
use crate::record::AttributeVersionRecord;
use crate::sink::{Element, ElementSink};
use crate::{DynexError, Step};

// =============================================================================
// EXPORT SHAPES
// =============================================================================

/// The two schema variants of an exported `attvalue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportShape {
    /// `for` and `value` only. No trace of time.
    Static,
    /// `for`, `value`, `start`, `end`, bounds rendered with the time format.
    Dynamic(TimeFormat),
}

impl ExportShape {
    /// Select the shape for a clock by querying its dynamics extension.
    #[must_use]
    pub fn for_clock(clock: &impl Clock) -> Self {
        if clock.is_extension_enabled(Extension::Dynamics) {
            Self::Dynamic(clock.time_format())
        } else {
            Self::Static
        }
    }

    /// Build the element for a record whose interval ends at `end`.
    #[must_use]
    pub fn element(self, record: &AttributeVersionRecord, end: Step) -> Element {
        let element = Element::new(ATTVALUE_ELEMENT)
            .with(ATTR_FOR, record.owner_id().as_str())
            .with(ATTR_VALUE, record.value().as_str());

        match self {
            Self::Static => element,
            Self::Dynamic(format) => element
                .with(ATTR_START, format.render(record.start()))
                .with(ATTR_END, format.render(end)),
        }
    }

    /// True if this shape carries interval bounds.
    #[must_use]
    pub fn is_dynamic(self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

// =============================================================================
// EXPORTER
// =============================================================================

/// Exports records against one frozen clock state.
#[derive(Debug, Clone, Copy)]
pub struct Exporter {
    snapshot: ClockSnapshot,
    shape: ExportShape,
}

impl Exporter {
    /// Freeze the clock and select the export shape.
    #[must_use]
    pub fn new(clock: &impl Clock) -> Self {
        let snapshot = clock.snapshot();
        Self {
            shape: ExportShape::for_clock(&snapshot),
            snapshot,
        }
    }

    /// Use an explicit shape instead of the one implied by the clock.
    #[must_use]
    pub fn with_shape(clock: &impl Clock, shape: ExportShape) -> Self {
        Self {
            snapshot: clock.snapshot(),
            shape,
        }
    }

    #[must_use]
    pub fn shape(&self) -> ExportShape {
        self.shape
    }

    #[must_use]
    pub fn snapshot(&self) -> ClockSnapshot {
        self.snapshot
    }

    /// Render a record without touching it.
    ///
    /// An open record is rendered as if sealed at the snapshot step. Fails
    /// with `InvalidInterval` if that step lies before the record's start.
    pub fn render(&self, record: &AttributeVersionRecord) -> Result<Element, DynexError> {
        let end = match record.end() {
            Some(end) => end,
            None => {
                let seal_at = self.snapshot.current_step();
                record.check_close(seal_at)?;
                seal_at
            }
        };
        Ok(self.shape.element(record, end))
    }

    /// Export one record, sealing it if it is still open.
    ///
    /// Exporting an already-closed record is a pure re-render and yields
    /// identical output every time.
    pub fn export<S: ElementSink + ?Sized>(
        &self,
        record: &mut AttributeVersionRecord,
        sink: &mut S,
    ) -> Result<(), DynexError> {
        let element = self.render(record)?;
        sink.write_element(&element)?;

        if record.is_open() {
            let seal_at = self.snapshot.current_step();
            record.close(seal_at)?;
            tracing::debug!(
                owner = %record.owner_id(),
                start = %record.start(),
                end = %seal_at,
                "sealed open record at export"
            );
        }
        Ok(())
    }
}

/// Export a single record against a clock.
pub fn export_record<S: ElementSink + ?Sized>(
    record: &mut AttributeVersionRecord,
    clock: &impl Clock,
    sink: &mut S,
) -> Result<(), DynexError> {
    Exporter::new(clock).export(record, sink)
}

// =============================================================================
// TESTS
// =============================================================================
