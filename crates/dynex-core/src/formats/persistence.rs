//! # Persistence Format
//!
//! Binary snapshots of a Dynex session.
//!
//! Format: Header (5 bytes) + postcard-serialized session data.
//! - 4 bytes: Magic ("DNEX")
//! - 1 byte: Version
//!
//! File I/O operations are in the app layer.
//!
//! ## Validation
//!
//! - Maximum payload size is checked before decoding
//! - Header is checked before the payload is parsed
//! - Every interval invariant is re-checked on the decoded records

use crate::primitives;
use crate::session::{SerializableSession, Session};
use crate::DynexError;

/// Maximum allowed snapshot size.
///
/// Validated BEFORE attempting deserialization.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 500 * 1024 * 1024; // 500 MB

/// Minimum valid snapshot size (header only).
const MIN_FILE_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all session data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), DynexError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(DynexError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(DynexError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 5] {
        let mut bytes = [0u8; 5];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DynexError> {
        let (Some(magic), Some(&version)) = (bytes.get(0..4), bytes.get(4)) else {
            return Err(DynexError::DeserializationError(
                "Header too short".to_string(),
            ));
        };
        let mut header = Self {
            magic: [0u8; 4],
            version,
        };
        header.magic.copy_from_slice(magic);
        Ok(header)
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a session to bytes (header + payload).
///
/// This is a pure transformation - no file I/O.
pub fn session_to_bytes(session: &Session) -> Result<Vec<u8>, DynexError> {
    let header = PersistenceHeader::new();
    let serializable = SerializableSession::from(session);

    let payload = postcard::to_stdvec(&serializable)
        .map_err(|e| DynexError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(MIN_FILE_SIZE.saturating_add(payload.len()));
    result.extend_from_slice(&header.to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// Deserialize a session from bytes.
///
/// This is a pure transformation - no file I/O.
pub fn session_from_bytes(bytes: &[u8]) -> Result<Session, DynexError> {
    if bytes.len() < MIN_FILE_SIZE {
        return Err(DynexError::DeserializationError(
            "Data too short: minimum 5 bytes required".to_string(),
        ));
    }

    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(DynexError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let payload = bytes.get(MIN_FILE_SIZE..).unwrap_or_default();
    let serializable: SerializableSession = postcard::from_bytes(payload).map_err(|e| {
        DynexError::DeserializationError(format!("Failed to deserialize session data: {}", e))
    })?;

    Session::try_from(serializable)
}

// =============================================================================
// TESTS
// =============================================================================
