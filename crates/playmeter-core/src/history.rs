//! Append-only session history

use playmeter_api::SessionRecord;

/// A numeric field of [`SessionRecord`] that can be summed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Cost,
    DurationMinutes,
}

impl RecordField {
    fn value(&self, record: &SessionRecord) -> f64 {
        match self {
            RecordField::Cost => record.cost(),
            RecordField::DurationMinutes => record.duration_minutes(),
        }
    }
}

/// Completed sessions, oldest first. Records are never edited; only a bulk
/// clear removes them.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    records: Vec<SessionRecord>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<SessionRecord>) -> Self {
        Self { records }
    }

    pub fn append(&mut self, record: SessionRecord) {
        self.records.push(record);
    }

    /// Remove every record, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        removed
    }

    pub fn all(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn sum(&self, field: RecordField) -> f64 {
        self.records.iter().map(|r| field.value(r)).sum()
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &SessionRecord> {
        self.records.iter().rev()
    }
}
