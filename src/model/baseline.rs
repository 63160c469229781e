use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::item::{DateSpan, ScheduleItem};

/// Whether a schedule is the frozen plan or the live execution copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleKind {
    Planning,
    Execution,
}

/// Metadata of the schedule being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleInfo {
    pub id: i64,
    pub name: String,
    pub kind: ScheduleKind,
    /// The frozen planning schedule this execution schedule was derived from.
    pub baseline_id: Option<i64>,
}

impl ScheduleInfo {
    /// The baseline to overlay, if this schedule has one.
    pub fn overlay_source(&self) -> Option<i64> {
        match self.kind {
            ScheduleKind::Execution => self.baseline_id,
            ScheduleKind::Planning => None,
        }
    }
}

/// Read-only name → dates snapshot of a frozen baseline schedule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaselineMap {
    entries: HashMap<String, DateSpan>,
}

impl BaselineMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the name is already present. The first occurrence wins.
    pub fn insert_first(&mut self, name: impl Into<String>, span: DateSpan) {
        self.entries.entry(name.into()).or_insert(span);
    }

    pub fn get(&self, name: &str) -> Option<DateSpan> {
        self.entries.get(name).copied()
    }

    pub fn for_item(&self, item: &ScheduleItem) -> Option<DateSpan> {
        self.get(&item.name)
    }

    /// Slip of the item's finish against its baseline, in days. Positive
    /// means late.
    pub fn variance_days(&self, item: &ScheduleItem) -> Option<i64> {
        let baseline = self.for_item(item)?;
        let current = item.display_span()?;
        Some((current.end - baseline.end).num_days())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
