//! # Property-Based Tests
//!
//! Interval and export invariants checked with proptest.

#![allow(clippy::float_arithmetic)]

use dynex_core::{
    AttValue, AttributeHistory, AttributeVersionRecord, Clock, GraphClock, MemorySink, OwnerId,
    Session, Step, XmlSink, session_from_bytes, session_to_bytes,
};
use proptest::collection::vec;
use proptest::prelude::*;

/// Writes as `(step delta, owner index, value index)`.
fn writes() -> impl Strategy<Value = Vec<(u32, u8, u8)>> {
    vec((0u32..5, 0u8..4, 0u8..6), 1..40)
}

/// Replay writes on a dynamic clock. Steps are cumulative deltas so the
/// clock never goes backwards.
fn replay(writes: &[(u32, u8, u8)]) -> (AttributeHistory, GraphClock) {
    let mut clock = GraphClock::dynamic();
    let mut history = AttributeHistory::new();
    let mut now: u32 = 0;

    for &(delta, owner, value) in writes {
        now = now.saturating_add(delta);
        clock
            .advance_to(Step::new(f64::from(now)).expect("finite"))
            .expect("advance");
        history
            .create(
                OwnerId::new(format!("n{}", owner)),
                AttValue::new(format!("v{}", value)),
                &clock,
            )
            .expect("write");
    }
    (history, clock)
}

proptest! {
    /// A freshly created record is open and starts at the given step.
    #[test]
    fn fresh_record_is_open(start in -1.0e9f64..1.0e9) {
        let step = Step::new(start).expect("finite");
        let record = AttributeVersionRecord::new(OwnerId::new("n"), AttValue::new("v"), step);

        prop_assert!(record.is_open());
        prop_assert_eq!(record.start(), step);
    }

    /// Closing succeeds iff the end is not before the start.
    #[test]
    fn close_respects_start(start in -1.0e6f64..1.0e6, at in -1.0e6f64..1.0e6) {
        let start = Step::new(start).expect("finite");
        let at = Step::new(at).expect("finite");
        let mut record = AttributeVersionRecord::new(OwnerId::new("n"), AttValue::new("v"), start);

        let result = record.close(at);
        prop_assert_eq!(result.is_ok(), at >= start);
        prop_assert_eq!(record.is_open(), at < start);
    }

    /// Every owner has at most one open record, and closed ends never
    /// precede their starts.
    #[test]
    fn history_intervals_are_well_formed(ws in writes()) {
        let (history, _) = replay(&ws);

        for record in history.records() {
            if let Some(end) = record.end() {
                prop_assert!(end >= record.start());
            }
        }
        for owner in 0u8..4 {
            let owner = OwnerId::new(format!("n{}", owner));
            prop_assert!(history.records_for(&owner).filter(|r| r.is_open()).count() <= 1);
        }
    }

    /// After an export pass every record is closed and the owner's
    /// consecutive intervals touch.
    #[test]
    fn export_seals_into_contiguous_timeline(ws in writes(), extra in 0u32..10) {
        let (mut history, mut clock) = replay(&ws);
        let end_step = Step::new(clock.current_step().value() + f64::from(extra)).expect("finite");
        clock.advance_to(end_step).expect("advance");

        history.export_all(&clock, &mut MemorySink::new()).expect("export");

        prop_assert_eq!(history.open_count(), 0);
        for owner in 0u8..4 {
            let owner = OwnerId::new(format!("n{}", owner));
            let records: Vec<_> = history.records_for(&owner).collect();
            for pair in records.windows(2) {
                prop_assert_eq!(pair[0].end(), Some(pair[1].start()));
            }
            if let Some(last) = records.last() {
                prop_assert_eq!(last.end(), Some(end_step));
            }
        }
    }

    /// Re-exporting after the seal yields identical bytes.
    #[test]
    fn export_is_idempotent_after_seal(ws in writes()) {
        let (mut history, clock) = replay(&ws);

        let mut first = XmlSink::new(Vec::new());
        history.export_all(&clock, &mut first).expect("first");
        let mut second = XmlSink::new(Vec::new());
        history.export_all(&clock, &mut second).expect("second");

        prop_assert_eq!(first.finish().expect("finish"), second.finish().expect("finish"));
    }

    /// Static clocks never emit interval bounds.
    #[test]
    fn static_export_never_has_bounds(ws in writes()) {
        let (mut history, dynamic) = replay(&ws);
        let mut clock = GraphClock::new();
        clock.advance_to(dynamic.current_step()).expect("advance");
        let mut sink = MemorySink::new();
        history.export_all(&clock, &mut sink).expect("export");

        for element in sink.elements() {
            prop_assert!(!element.has_attribute("start"));
            prop_assert!(!element.has_attribute("end"));
        }
    }

    /// Snapshots survive a save/load cycle unchanged.
    #[test]
    fn snapshot_roundtrip(ws in writes()) {
        let (history, clock) = replay(&ws);
        let mut session = Session::with_clock(clock);
        for record in history.records() {
            session
                .set_attribute(record.owner_id().clone(), record.value().clone())
                .expect("write");
        }

        let bytes = session_to_bytes(&session).expect("save");
        let restored = session_from_bytes(&bytes).expect("load");
        prop_assert_eq!(restored, session);
    }
}
