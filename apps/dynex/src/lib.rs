//! # Dynex Library
//!
//! Command-line surface of Dynex, exposed as a library for integration tests.

pub mod cli;
pub mod config;
pub mod script;
