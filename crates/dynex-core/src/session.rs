//! # Session Module
//!
//! Session management combining the graph clock and the attribute history.
//!
//! A session is the single writer of one graph's temporal attributes:
//! - attribute writes and removals are stamped with the session clock
//! - the clock only moves forward
//! - export passes freeze the clock once and seal open records
//!
//! Writes and exports take `&mut self`, so they can never interleave.

use crate::clock::{Clock, Extension, GraphClock};
use crate::formats::TimeFormat;
use crate::history::{AttributeHistory, RecordId};
use crate::primitives::ATTVALUES_ELEMENT;
use crate::record::AttributeVersionRecord;
use crate::sink::{ElementSink, XmlSink};
use crate::{AttValue, DynexError, OwnerId, Step};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// A graph's temporal attribute state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    clock: GraphClock,
    history: AttributeHistory,
}

impl Session {
    /// Create an empty static session at step 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session around an existing clock.
    #[must_use]
    pub fn with_clock(clock: GraphClock) -> Self {
        Self {
            clock,
            history: AttributeHistory::new(),
        }
    }

    /// Move the clock forward.
    pub fn advance_to(&mut self, step: Step) -> Result<(), DynexError> {
        self.clock.advance_to(step)
    }

    /// Assign a value to an owner at the current step.
    pub fn set_attribute(
        &mut self,
        owner_id: impl Into<OwnerId>,
        value: impl Into<AttValue>,
    ) -> Result<RecordId, DynexError> {
        self.history
            .create(owner_id.into(), value.into(), &self.clock)
    }

    /// Remove an owner's attribute at the current step.
    pub fn remove_attribute(&mut self, owner_id: &OwnerId) -> Result<Option<RecordId>, DynexError> {
        self.history.remove(owner_id, &self.clock)
    }

    /// Toggle the dynamics extension.
    pub fn set_dynamic(&mut self, dynamic: bool) {
        if dynamic {
            self.clock.enable(Extension::Dynamics);
        } else {
            self.clock.disable(Extension::Dynamics);
        }
    }

    /// Change how interval bounds are rendered.
    pub fn set_time_format(&mut self, format: TimeFormat) {
        self.clock.set_time_format(format);
    }

    /// Export every record to a sink in assignment order.
    pub fn export<S: ElementSink + ?Sized>(&mut self, sink: &mut S) -> Result<usize, DynexError> {
        self.history.export_all(&self.clock, sink)
    }

    /// Export every record as an `<attvalues>` XML block.
    ///
    /// Returns the writer once the block is complete and flushed.
    pub fn export_xml<W: Write>(&mut self, writer: W, indent: usize) -> Result<W, DynexError> {
        let mut sink = XmlSink::new(writer).with_indent(indent);
        sink.declaration()?;
        sink.begin(ATTVALUES_ELEMENT, &[])?;
        self.export(&mut sink)?;
        sink.end()?;
        sink.finish()
    }

    #[must_use]
    pub fn clock(&self) -> &GraphClock {
        &self.clock
    }

    #[must_use]
    pub fn history(&self) -> &AttributeHistory {
        &self.history
    }

    #[must_use]
    pub fn current_step(&self) -> Step {
        self.clock.current_step()
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.clock.is_extension_enabled(Extension::Dynamics)
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

/// Serializable form of a session.
///
/// The open-record index is derived state and is rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableSession {
    pub clock: GraphClock,
    pub records: Vec<AttributeVersionRecord>,
}

impl From<&Session> for SerializableSession {
    fn from(session: &Session) -> Self {
        Self {
            clock: session.clock.clone(),
            records: session.history.records().to_vec(),
        }
    }
}

impl TryFrom<SerializableSession> for Session {
    type Error = DynexError;

    fn try_from(s: SerializableSession) -> Result<Self, Self::Error> {
        let step = s.clock.current_step();
        if !step.is_finite() {
            return Err(DynexError::DeserializationError(
                "Clock step is not finite".to_string(),
            ));
        }
        let history = AttributeHistory::from_records(s.records, step)?;
        Ok(Self {
            clock: s.clock,
            history,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
