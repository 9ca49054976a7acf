//! # Formats
//!
//! Rendering and persistence formats for the Dynex CORE.
//!
//! - `time`: rendering of steps as numbers or calendar dates
//! - `persistence`: binary session snapshots (header + postcard payload)
//!
//! File I/O operations are in the app layer.

mod persistence;
mod time;

pub use persistence::*;
pub use time::*;
