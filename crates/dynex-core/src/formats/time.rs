//! # Time Formats
//!
//! Rendering of steps for the `start`/`end` attributes and the graph-level
//! `timeformat` declaration.
//!
//! Calendar formats interpret a step as milliseconds since the Unix epoch,
//! in UTC. Fractional milliseconds are truncated.

use crate::{DynexError, Step};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pattern for the `date` format.
const DATE_PATTERN: &str = "%Y-%m-%d";

/// Pattern for the `dateTime` format.
const DATETIME_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%z";

/// How steps are rendered in exported elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    /// Rounded to a whole number: `5`.
    Integer,
    /// Shortest round-trip plain decimal with a fractional part: `5.0`,
    /// `2.75`, `0.00001`. Never uses exponent notation.
    #[default]
    Double,
    /// Calendar date: `2023-11-14`.
    Date,
    /// Calendar date and time with offset: `2023-11-14T22:13:20+0000`.
    #[serde(alias = "dateTime")]
    DateTime,
}

impl TimeFormat {
    /// All formats, in declaration order.
    pub const ALL: [TimeFormat; 4] = [
        TimeFormat::Integer,
        TimeFormat::Double,
        TimeFormat::Date,
        TimeFormat::DateTime,
    ];

    /// Render a step.
    ///
    /// Steps outside the calendar range fall back to the `Double` rendering
    /// so that an interval bound is never dropped.
    #[must_use]
    pub fn render(self, step: Step) -> String {
        let value = step.value();
        match self {
            Self::Integer => format!("{:.0}", value),
            Self::Double => render_double(value),
            Self::Date => render_calendar(value, DATE_PATTERN),
            Self::DateTime => render_calendar(value, DATETIME_PATTERN),
        }
    }

    /// The value of the GEXF `timeformat` graph attribute.
    #[must_use]
    pub const fn gexf_name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Date => "date",
            Self::DateTime => "dateTime",
        }
    }
}

fn render_double(value: f64) -> String {
    let plain = value.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

fn render_calendar(millis: f64, pattern: &str) -> String {
    match DateTime::from_timestamp_millis(millis as i64) {
        Some(instant) => instant.format(pattern).to_string(),
        None => render_double(millis),
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.gexf_name())
    }
}

impl FromStr for TimeFormat {
    type Err = DynexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(Self::Integer),
            "double" | "float" => Ok(Self::Double),
            "date" => Ok(Self::Date),
            "datetime" => Ok(Self::DateTime),
            other => Err(DynexError::InvalidConfig(format!(
                "Unknown time format: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
