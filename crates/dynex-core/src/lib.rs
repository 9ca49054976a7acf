//! # dynex-core
//!
//! The temporal attribute-value engine for Dynex - THE LOGIC.
//!
//! This crate versions the attribute values of a dynamic graph over a
//! real-valued step axis and exports them as interval-tagged GEXF
//! `attvalue` elements.
//!
//! ## Model
//!
//! - Every write creates a new [`AttributeVersionRecord`] starting at the
//!   clock's current step; the owner's previous record is closed there.
//! - A record still open at export is sealed at the export step, so an
//!   unchanged value is reported as valid through "now".
//! - `start`/`end` are emitted only when the dynamics extension is enabled.
//!
//! ## Architectural Constraints
//!
//! - The clock is always passed explicitly; there is no global time
//! - History is append-only: values are never edited in place
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod clock;
pub mod export;
pub mod formats;
pub mod history;
pub mod primitives;
pub mod record;
pub mod session;
pub mod sink;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{AttValue, DynexError, OwnerId, Step};

// =============================================================================
// RE-EXPORTS: Versioning + Export
// =============================================================================

pub use clock::{Clock, ClockSnapshot, Extension, ExtensionSet, GraphClock};
pub use export::{ExportShape, Exporter, export_record};
pub use history::{AttributeHistory, RecordId};
pub use record::{AttributeVersionRecord, Interval};
pub use session::{SerializableSession, Session};
pub use sink::{Element, ElementSink, MemorySink, XmlSink, escape_attribute};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{PersistenceHeader, TimeFormat, session_from_bytes, session_to_bytes};
