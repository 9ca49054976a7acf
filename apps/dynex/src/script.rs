//! # Write Scripts
//!
//! JSON input for the `ingest` command: an ordered list of attribute writes.
//!
//! ```json
//! [
//!   { "step": 0, "owner": "n1:color", "value": "red" },
//!   { "step": 3, "owner": "n1:color", "value": "blue" },
//!   { "step": 4, "owner": "n1:size",  "value": 2.5 },
//!   { "step": 6, "owner": "n1:color", "remove": true }
//! ]
//! ```
//!
//! `step` is optional and advances the clock before the event applies.
//! Values may be strings, numbers or booleans; they are rendered once, on
//! ingestion.

use dynex_core::primitives::{MAX_OWNER_ID_LENGTH, MAX_VALUE_LENGTH};
use dynex_core::{AttValue, DynexError, OwnerId, Session, Step};
use serde::Deserialize;

/// Maximum number of events in one script.
pub const MAX_SCRIPT_EVENTS: usize = 1_000_000;

/// One scripted write or removal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptEvent {
    #[serde(default)]
    pub step: Option<f64>,
    pub owner: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub remove: bool,
}

/// What a script did to a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSummary {
    pub writes: usize,
    pub removals: usize,
}

/// Parse a script from JSON bytes.
pub fn parse_script(bytes: &[u8]) -> Result<Vec<ScriptEvent>, DynexError> {
    let events: Vec<ScriptEvent> = serde_json::from_slice(bytes)
        .map_err(|e| DynexError::DeserializationError(format!("Invalid script: {}", e)))?;

    if events.len() > MAX_SCRIPT_EVENTS {
        return Err(DynexError::DeserializationError(format!(
            "Event count {} exceeds maximum allowed {}",
            events.len(),
            MAX_SCRIPT_EVENTS
        )));
    }
    Ok(events)
}

/// Render a scalar JSON value the way GEXF expects it.
fn render_value(value: &serde_json::Value) -> Result<AttValue, DynexError> {
    let rendered = match value {
        serde_json::Value::String(s) => AttValue::new(s.as_str()),
        serde_json::Value::Bool(b) => AttValue::from(*b),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => AttValue::from(i),
            (None, Some(f)) => AttValue::from(f),
            (None, None) => AttValue::new(n.to_string()),
        },
        other => {
            return Err(DynexError::DeserializationError(format!(
                "Unsupported value type: {}",
                other
            )));
        }
    };

    if rendered.as_str().len() > MAX_VALUE_LENGTH {
        return Err(DynexError::DeserializationError(format!(
            "Value length {} exceeds maximum {}",
            rendered.as_str().len(),
            MAX_VALUE_LENGTH
        )));
    }
    Ok(rendered)
}

fn validate_owner(owner: &str) -> Result<OwnerId, DynexError> {
    if owner.is_empty() || owner.len() > MAX_OWNER_ID_LENGTH {
        return Err(DynexError::DeserializationError(format!(
            "Owner id must be 1..={} bytes, got {}",
            MAX_OWNER_ID_LENGTH,
            owner.len()
        )));
    }
    Ok(OwnerId::new(owner))
}

/// Apply events to a session in order.
///
/// Stops at the first failing event. Events before it stay applied.
pub fn apply_script(
    session: &mut Session,
    events: &[ScriptEvent],
) -> Result<ScriptSummary, DynexError> {
    let mut summary = ScriptSummary::default();

    for (index, event) in events.iter().enumerate() {
        if let Some(step) = event.step {
            session.advance_to(Step::new(step)?)?;
        }
        let owner = validate_owner(&event.owner)?;

        match (event.remove, &event.value) {
            (true, None) => {
                if session.remove_attribute(&owner)?.is_some() {
                    summary.removals = summary.removals.saturating_add(1);
                } else {
                    tracing::warn!("Event {}: '{}' has no value to remove", index, owner);
                }
            }
            (false, Some(value)) => {
                session.set_attribute(owner, render_value(value)?)?;
                summary.writes = summary.writes.saturating_add(1);
            }
            (true, Some(_)) => {
                return Err(DynexError::DeserializationError(format!(
                    "Event {}: 'remove' and 'value' are mutually exclusive",
                    index
                )));
            }
            (false, None) => {
                return Err(DynexError::DeserializationError(format!(
                    "Event {}: missing 'value'",
                    index
                )));
            }
        }
    }

    Ok(summary)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_apply_script() {
        let events = parse_script(
            br#"[
                {"step": 0, "owner": "n1:color", "value": "red"},
                {"step": 3, "owner": "n1:color", "value": "blue"},
                {"owner": "n1:size", "value": 2.5},
                {"owner": "n1:visible", "value": true},
                {"step": 6, "owner": "n1:color", "remove": true}
            ]"#,
        )
        .unwrap();

        let mut session = Session::new();
        let summary = apply_script(&mut session, &events).unwrap();

        assert_eq!(summary, ScriptSummary { writes: 4, removals: 1 });
        assert_eq!(session.current_step(), Step::new(6.0).unwrap());

        let values: Vec<_> = session
            .history()
            .records()
            .iter()
            .map(|r| r.value().as_str())
            .collect();
        assert_eq!(values, vec!["red", "blue", "2.5", "true"]);
        assert_eq!(session.history().open_count(), 2);
    }

    #[test]
    fn integers_render_without_decimal() {
        assert_eq!(render_value(&serde_json::json!(7)).unwrap().as_str(), "7");
        assert_eq!(render_value(&serde_json::json!(7.0)).unwrap().as_str(), "7.0");
    }

    #[test]
    fn nested_values_rejected() {
        assert!(render_value(&serde_json::json!({"r": 1})).is_err());
        assert!(render_value(&serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn backwards_step_rejected() {
        let events = parse_script(
            br#"[
                {"step": 5, "owner": "n1", "value": "a"},
                {"step": 2, "owner": "n1", "value": "b"}
            ]"#,
        )
        .unwrap();

        let mut session = Session::new();
        let result = apply_script(&mut session, &events);

        assert!(matches!(result, Err(DynexError::NonMonotonicStep { .. })));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn malformed_events_rejected() {
        assert!(parse_script(br#"[{"owner": "n1", "value": "a", "colour": 1}]"#).is_err());

        let mut session = Session::new();
        let missing = parse_script(br#"[{"owner": "n1"}]"#).unwrap();
        assert!(apply_script(&mut session, &missing).is_err());

        let both = parse_script(br#"[{"owner": "n1", "value": "a", "remove": true}]"#).unwrap();
        assert!(apply_script(&mut session, &both).is_err());

        let empty_owner = parse_script(br#"[{"owner": "", "value": "a"}]"#).unwrap();
        assert!(apply_script(&mut session, &empty_owner).is_err());
    }
}
