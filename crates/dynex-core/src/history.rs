//! # Attribute History
//!
//! The arena that owns every attribute version record of a graph.
//!
//! - Records are stored in assignment order and addressed by `RecordId`.
//! - At most one record per owner is open at any time.
//! - A write closes the owner's open record at the new record's start.
//! - Nothing outside this module can mutate a record's interval; callers
//!   only ever see `&AttributeVersionRecord`.

use crate::clock::Clock;
use crate::export::Exporter;
use crate::primitives::MAX_SNAPSHOT_RECORDS;
use crate::record::AttributeVersionRecord;
use crate::sink::ElementSink;
use crate::{AttValue, DynexError, OwnerId, Step};
use std::collections::BTreeMap;

/// Handle to a record inside an [`AttributeHistory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub usize);

/// Append-only timeline of attribute versions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeHistory {
    /// Records in assignment order.
    records: Vec<AttributeVersionRecord>,
    /// The open record of each owner, if any.
    open: BTreeMap<OwnerId, RecordId>,
}

impl AttributeHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from records in assignment order.
    ///
    /// Checks every interval against `now`, the start ordering, and that each
    /// owner's records form a non-overlapping timeline with at most one open
    /// record at its tail.
    pub fn from_records(
        records: Vec<AttributeVersionRecord>,
        now: Step,
    ) -> Result<Self, DynexError> {
        if records.len() > MAX_SNAPSHOT_RECORDS {
            return Err(DynexError::DeserializationError(format!(
                "Record count {} exceeds maximum {}",
                records.len(),
                MAX_SNAPSHOT_RECORDS
            )));
        }

        let mut open = BTreeMap::new();
        let mut latest_end: BTreeMap<&OwnerId, Option<Step>> = BTreeMap::new();
        let mut previous_start: Option<Step> = None;

        for (index, record) in records.iter().enumerate() {
            record.validate()?;

            if previous_start.is_some_and(|prev| record.start() < prev) {
                return Err(DynexError::DeserializationError(format!(
                    "Record {} for '{}' starts before its predecessor",
                    index,
                    record.owner_id()
                )));
            }
            previous_start = Some(record.start());

            if record.start() > now || record.end().is_some_and(|end| end > now) {
                return Err(DynexError::DeserializationError(format!(
                    "Record {} for '{}' extends past the clock step {}",
                    index,
                    record.owner_id(),
                    now
                )));
            }

            match latest_end.insert(record.owner_id(), record.end()) {
                Some(None) => {
                    return Err(DynexError::DeserializationError(format!(
                        "Owner '{}' has more than one open record",
                        record.owner_id()
                    )));
                }
                Some(Some(end)) if end > record.start() => {
                    return Err(DynexError::DeserializationError(format!(
                        "Record {} for '{}' overlaps the previous version ending at {}",
                        index,
                        record.owner_id(),
                        end
                    )));
                }
                _ => {}
            }

            if record.is_open() {
                open.insert(record.owner_id().clone(), RecordId(index));
            }
        }

        Ok(Self { records, open })
    }

    /// Record a new value for `owner_id` at the clock's current step.
    ///
    /// Any open record of the same owner is closed at the new start. If that
    /// close fails the history is left unchanged.
    pub fn create(
        &mut self,
        owner_id: OwnerId,
        value: AttValue,
        clock: &impl Clock,
    ) -> Result<RecordId, DynexError> {
        let record = AttributeVersionRecord::at_clock(owner_id, value, clock);
        let start = record.start();

        let records = &mut self.records;
        if let Some(previous) = self
            .open
            .get(record.owner_id())
            .and_then(|id| records.get_mut(id.0))
        {
            previous.close(start).inspect_err(|e| {
                tracing::warn!(error = %e, "rejected write: superseded record cannot close");
            })?;
            tracing::debug!(owner = %record.owner_id(), at = %start, "closed superseded record");
        }

        let id = RecordId(self.records.len());
        self.open.insert(record.owner_id().clone(), id);
        self.records.push(record);
        Ok(id)
    }

    /// Close the open record of `owner_id` at the clock's current step.
    ///
    /// Used when an attribute is removed from its element. Returns the closed
    /// record, or `None` if the owner had no open record.
    pub fn remove(
        &mut self,
        owner_id: &OwnerId,
        clock: &impl Clock,
    ) -> Result<Option<RecordId>, DynexError> {
        let Some(&id) = self.open.get(owner_id) else {
            return Ok(None);
        };
        if let Some(record) = self.records.get_mut(id.0) {
            record.close(clock.current_step())?;
        }
        self.open.remove(owner_id);
        tracing::debug!(owner = %owner_id, at = %clock.current_step(), "closed removed attribute");
        Ok(Some(id))
    }

    /// Export every record in assignment order.
    ///
    /// The clock is frozen once for the whole pass. The first failing record
    /// aborts the pass; records exported before it stay sealed.
    pub fn export_all<S: ElementSink + ?Sized>(
        &mut self,
        clock: &impl Clock,
        sink: &mut S,
    ) -> Result<usize, DynexError> {
        let exporter = Exporter::new(clock);
        let mut exported = 0usize;

        let result = self.records.iter_mut().try_for_each(|record| {
            exporter.export(record, sink)?;
            exported = exported.saturating_add(1);
            Ok(())
        });

        let records = &self.records;
        self.open
            .retain(|_, id| records.get(id.0).is_some_and(AttributeVersionRecord::is_open));

        match &result {
            Ok(()) => tracing::debug!(records = exported, "export pass complete"),
            Err(e) => tracing::warn!(exported, error = %e, "export pass aborted"),
        }
        result.map(|()| exported)
    }

    /// Get a record by id.
    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<&AttributeVersionRecord> {
        self.records.get(id.0)
    }

    /// All records in assignment order.
    #[must_use]
    pub fn records(&self) -> &[AttributeVersionRecord] {
        &self.records
    }

    /// Records of one owner, in assignment order.
    pub fn records_for<'a>(
        &'a self,
        owner_id: &'a OwnerId,
    ) -> impl Iterator<Item = &'a AttributeVersionRecord> + 'a {
        self.records
            .iter()
            .filter(move |record| record.owner_id() == owner_id)
    }

    /// The currently open record of an owner.
    #[must_use]
    pub fn open_record(&self, owner_id: &OwnerId) -> Option<&AttributeVersionRecord> {
        self.open.get(owner_id).and_then(|id| self.get(*id))
    }

    /// The value an owner held at `step`, replaying the step function.
    ///
    /// Zero-length versions (superseded on the step they were written) are
    /// never returned.
    #[must_use]
    pub fn value_at(&self, owner_id: &OwnerId, step: Step) -> Option<&AttValue> {
        self.records
            .iter()
            .rev()
            .find(|record| record.owner_id() == owner_id && record.is_active_at(step))
            .map(AttributeVersionRecord::value)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no record was ever created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of open records.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Consume the history, returning records in assignment order.
    #[must_use]
    pub fn into_records(self) -> Vec<AttributeVersionRecord> {
        self.records
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::clock::{Extension, GraphClock};
    use crate::sink::{Element, MemorySink};

    fn step(v: f64) -> Step {
        Step::new(v).expect("finite")
    }

    fn owner(s: &str) -> OwnerId {
        OwnerId::new(s)
    }

    struct FailAfter(usize, MemorySink);

    impl ElementSink for FailAfter {
        fn write_element(&mut self, element: &Element) -> Result<(), DynexError> {
            if self.1.len() >= self.0 {
                return Err(DynexError::SerializationError("broken pipe".to_string()));
            }
            self.1.write_element(element)
        }
    }

    #[test]
    fn create_opens_record_at_current_step() {
        let mut clock = GraphClock::dynamic();
        clock.advance_to(step(2.0)).unwrap();
        let mut history = AttributeHistory::new();

        let id = history.create(owner("n1"), AttValue::new("red"), &clock).unwrap();

        let record = history.get(id).unwrap();
        assert!(record.is_open());
        assert_eq!(record.start(), step(2.0));
        assert_eq!(history.open_count(), 1);
    }

    #[test]
    fn second_write_closes_first() {
        let mut clock = GraphClock::dynamic();
        let mut history = AttributeHistory::new();

        let red = history.create(owner("n1"), AttValue::new("red"), &clock).unwrap();
        clock.advance_to(step(3.0)).unwrap();
        let blue = history.create(owner("n1"), AttValue::new("blue"), &clock).unwrap();

        assert_eq!(history.get(red).unwrap().end(), Some(step(3.0)));
        assert!(history.get(blue).unwrap().is_open());
        assert_eq!(history.open_count(), 1);
        assert_eq!(history.open_record(&owner("n1")).unwrap().value().as_str(), "blue");
    }

    #[test]
    fn writes_to_other_owners_stay_independent() {
        let mut clock = GraphClock::new();
        let mut history = AttributeHistory::new();

        history.create(owner("n1"), AttValue::new("a"), &clock).unwrap();
        clock.advance_to(step(1.0)).unwrap();
        history.create(owner("n2"), AttValue::new("b"), &clock).unwrap();

        assert_eq!(history.open_count(), 2);
        assert_eq!(history.records_for(&owner("n1")).count(), 1);
    }

    #[test]
    fn write_behind_open_record_is_rejected_unchanged() {
        let mut late = GraphClock::new();
        late.advance_to(step(5.0)).unwrap();
        let early = GraphClock::new();
        let mut history = AttributeHistory::new();

        history.create(owner("n1"), AttValue::new("red"), &late).unwrap();
        let result = history.create(owner("n1"), AttValue::new("blue"), &early);

        assert!(matches!(result, Err(DynexError::InvalidInterval { .. })));
        assert_eq!(history.len(), 1);
        assert!(history.records()[0].is_open());
    }

    #[test]
    fn remove_closes_open_record() {
        let mut clock = GraphClock::new();
        let mut history = AttributeHistory::new();
        history.create(owner("n1"), AttValue::new("red"), &clock).unwrap();

        clock.advance_to(step(4.0)).unwrap();
        let closed = history.remove(&owner("n1"), &clock).unwrap();

        assert!(closed.is_some());
        assert_eq!(history.records()[0].end(), Some(step(4.0)));
        assert_eq!(history.open_count(), 0);
        assert_eq!(history.remove(&owner("n1"), &clock).unwrap(), None);
    }

    #[test]
    fn export_all_seals_and_clears_open_index() {
        let mut clock = GraphClock::dynamic();
        let mut history = AttributeHistory::new();
        history.create(owner("n1"), AttValue::new("red"), &clock).unwrap();
        clock.advance_to(step(3.0)).unwrap();
        history.create(owner("n1"), AttValue::new("blue"), &clock).unwrap();
        clock.advance_to(step(5.0)).unwrap();

        let mut sink = MemorySink::new();
        let count = history.export_all(&clock, &mut sink).unwrap();

        assert_eq!(count, 2);
        assert_eq!(history.open_count(), 0);
        let ends: Vec<_> = sink
            .elements()
            .iter()
            .map(|e| e.attribute("end").unwrap().to_string())
            .collect();
        assert_eq!(ends, vec!["3.0", "5.0"]);
    }

    #[test]
    fn write_after_seal_starts_new_version() {
        let mut clock = GraphClock::dynamic();
        let mut history = AttributeHistory::new();
        history.create(owner("n1"), AttValue::new("red"), &clock).unwrap();
        clock.advance_to(step(2.0)).unwrap();
        history.export_all(&clock, &mut MemorySink::new()).unwrap();

        clock.advance_to(step(6.0)).unwrap();
        history.create(owner("n1"), AttValue::new("green"), &clock).unwrap();

        assert_eq!(history.records()[0].end(), Some(step(2.0)));
        assert!(history.records()[1].is_open());
        assert_eq!(history.open_count(), 1);
    }

    #[test]
    fn failing_sink_aborts_pass() {
        let mut clock = GraphClock::dynamic();
        let mut history = AttributeHistory::new();
        history.create(owner("a"), AttValue::new("1"), &clock).unwrap();
        history.create(owner("b"), AttValue::new("2"), &clock).unwrap();
        history.create(owner("c"), AttValue::new("3"), &clock).unwrap();
        clock.advance_to(step(1.0)).unwrap();

        let mut sink = FailAfter(1, MemorySink::new());
        let result = history.export_all(&clock, &mut sink);

        assert!(matches!(result, Err(DynexError::SerializationError(_))));
        assert_eq!(sink.1.len(), 1);
        assert!(!history.records()[0].is_open());
        assert!(history.records()[1].is_open());
        assert!(history.records()[2].is_open());
        assert_eq!(history.open_count(), 2);
    }

    #[test]
    fn value_at_replays_step_function() {
        let mut clock = GraphClock::new();
        let mut history = AttributeHistory::new();
        history.create(owner("n1"), AttValue::new("red"), &clock).unwrap();
        clock.advance_to(step(3.0)).unwrap();
        history.create(owner("n1"), AttValue::new("blue"), &clock).unwrap();

        let at = |v: f64| history.value_at(&owner("n1"), step(v)).map(AttValue::as_str);
        assert_eq!(at(0.0), Some("red"));
        assert_eq!(at(2.9), Some("red"));
        assert_eq!(at(3.0), Some("blue"));
        assert_eq!(at(100.0), Some("blue"));
        assert_eq!(history.value_at(&owner("n2"), step(1.0)), None);
    }

    #[test]
    fn same_step_rewrite_hides_first_value() {
        let clock = GraphClock::new();
        let mut history = AttributeHistory::new();
        history.create(owner("n1"), AttValue::new("red"), &clock).unwrap();
        history.create(owner("n1"), AttValue::new("blue"), &clock).unwrap();

        assert_eq!(
            history.value_at(&owner("n1"), Step::ZERO).map(AttValue::as_str),
            Some("blue")
        );
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn from_records_rebuilds_open_index() {
        let mut clock = GraphClock::new();
        clock.enable(Extension::Dynamics);
        let mut history = AttributeHistory::new();
        history.create(owner("n1"), AttValue::new("red"), &clock).unwrap();
        clock.advance_to(step(1.0)).unwrap();
        history.create(owner("n1"), AttValue::new("blue"), &clock).unwrap();

        let rebuilt = AttributeHistory::from_records(history.clone().into_records(), clock.current_step())
                .unwrap();
        assert_eq!(rebuilt, history);
    }

    #[test]
    fn from_records_rejects_two_open_records() {
        let records = vec![
            AttributeVersionRecord::new(owner("n1"), AttValue::new("a"), Step::ZERO),
            AttributeVersionRecord::new(owner("n1"), AttValue::new("b"), step(1.0)),
        ];
        assert!(matches!(
            AttributeHistory::from_records(records, step(1.0)),
            Err(DynexError::DeserializationError(_))
        ));
    }

    #[test]
    fn from_records_rejects_unordered_starts() {
        let records = vec![
            AttributeVersionRecord::new(owner("n1"), AttValue::new("a"), step(2.0)),
            AttributeVersionRecord::new(owner("n2"), AttValue::new("b"), step(1.0)),
        ];
        assert!(AttributeHistory::from_records(records, step(2.0)).is_err());
    }

    #[test]
    fn from_records_rejects_end_past_clock() {
        let mut record = AttributeVersionRecord::new(owner("n1"), AttValue::new("a"), Step::ZERO);
        record.close(step(9.0)).unwrap();

        assert!(matches!(
            AttributeHistory::from_records(vec![record.clone()], step(3.0)),
            Err(DynexError::DeserializationError(_))
        ));
        assert!(AttributeHistory::from_records(vec![record], step(9.0)).is_ok());
    }

    #[test]
    fn from_records_rejects_overlapping_versions() {
        let mut first = AttributeVersionRecord::new(owner("n1"), AttValue::new("a"), Step::ZERO);
        first.close(step(4.0)).unwrap();
        let second = AttributeVersionRecord::new(owner("n1"), AttValue::new("b"), step(2.0));

        assert!(matches!(
            AttributeHistory::from_records(vec![first.clone(), second], step(5.0)),
            Err(DynexError::DeserializationError(_))
        ));

        let touching = AttributeVersionRecord::new(owner("n1"), AttValue::new("b"), step(4.0));
        let history = AttributeHistory::from_records(vec![first, touching], step(5.0)).unwrap();
        assert_eq!(history.open_count(), 1);
    }

    #[test]
    fn from_records_rejects_version_after_open_record() {
        let open = AttributeVersionRecord::new(owner("n1"), AttValue::new("a"), Step::ZERO);
        let mut later = AttributeVersionRecord::new(owner("n1"), AttValue::new("b"), step(1.0));
        later.close(step(2.0)).unwrap();

        assert!(AttributeHistory::from_records(vec![open, later], step(2.0)).is_err());
    }
}
