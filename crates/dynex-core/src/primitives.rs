//! # Format Primitives
//!
//! Hardcoded constants for the Dynex CORE.
//!
//! These cover the two wire formats the engine speaks:
//! 1. **GEXF attvalue elements**: element and attribute names.
//! 2. **Binary snapshots**: magic bytes, version, and decode limits.

// =============================================================================
// GEXF NAMES
// =============================================================================

/// Name of the exported element, one per attribute version.
pub const ATTVALUE_ELEMENT: &str = "attvalue";

/// Name of the container element that groups `attvalue` elements.
pub const ATTVALUES_ELEMENT: &str = "attvalues";

/// Attribute carrying the owner id.
pub const ATTR_FOR: &str = "for";

/// Attribute carrying the rendered value.
pub const ATTR_VALUE: &str = "value";

/// Attribute carrying the interval start (dynamics only).
pub const ATTR_START: &str = "start";

/// Attribute carrying the interval end (dynamics only).
pub const ATTR_END: &str = "end";

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes for the Dynex snapshot header.
///
/// - File Header = Magic Bytes ("DNEX") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"DNEX";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum number of records accepted when decoding a snapshot.
///
/// Checked after decoding and before the history index is rebuilt.
pub const MAX_SNAPSHOT_RECORDS: usize = 10_000_000;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for owner id strings.
pub const MAX_OWNER_ID_LENGTH: usize = 256;

/// Maximum length for rendered values.
pub const MAX_VALUE_LENGTH: usize = 64 * 1024;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"DNEX");
    }

    #[test]
    fn wire_names_match_gexf() {
        assert_eq!(ATTVALUE_ELEMENT, "attvalue");
        assert_eq!(
            [ATTR_FOR, ATTR_VALUE, ATTR_START, ATTR_END],
            ["for", "value", "start", "end"]
        );
    }
}
