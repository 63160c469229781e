//! Hierarchy-aware vertical layout.
//!
//! Rows are produced by a depth-first walk of phase → work package → task →
//! subtask. A node's children are only visited when the node itself is in the
//! [`ExpandedSet`], so a collapsed ancestor removes its whole subtree and all
//! of its vertical space.

use std::collections::{BTreeSet, HashMap};

use crate::model::{ItemKey, Level, ScheduleItem, ScheduleItems};

/// Item keys currently expanded. Everything starts collapsed.
///
/// Treated as a value: toggling returns a new set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedSet {
    keys: BTreeSet<ItemKey>,
}

impl ExpandedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: ItemKey) -> bool {
        self.keys.contains(&key)
    }

    /// A copy of this set with `key` flipped.
    #[must_use]
    pub fn toggled(&self, key: ItemKey) -> Self {
        let mut keys = self.keys.clone();
        if !keys.remove(&key) {
            keys.insert(key);
        }
        Self { keys }
    }

    /// A copy of this set with every key in `keys` expanded.
    #[must_use]
    pub fn with_all(&self, keys: impl IntoIterator<Item = ItemKey>) -> Self {
        let mut next = self.keys.clone();
        next.extend(keys);
        Self { keys: next }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// One visible row of the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row {
    pub key: ItemKey,
    /// Top edge, measured from the top of the row area.
    pub y: f32,
    pub height: f32,
}

impl Row {
    pub fn level(&self) -> Level {
        self.key.level
    }

    pub fn mid_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Compute the ordered list of visible rows. Pure.
pub fn compute_rows(items: &ScheduleItems, expanded: &ExpandedSet) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut y = 0.0;
    for phase in &items.phases {
        walk(items, expanded, phase, &mut y, &mut rows);
    }
    rows
}

fn walk(
    items: &ScheduleItems,
    expanded: &ExpandedSet,
    item: &ScheduleItem,
    y: &mut f32,
    rows: &mut Vec<Row>,
) {
    let height = item.level().row_height();
    rows.push(Row {
        key: item.key,
        y: *y,
        height,
    });
    *y += height;

    if expanded.contains(item.key) {
        for child in items.children_of(item.key) {
            walk(items, expanded, child, y, rows);
        }
    }
}

pub fn total_height(rows: &[Row]) -> f32 {
    rows.last().map(|r| r.bottom()).unwrap_or(0.0)
}

/// Key → row lookup over one layout pass.
#[derive(Debug, Clone, Default)]
pub struct RowIndex {
    rows: Vec<Row>,
    by_key: HashMap<ItemKey, usize>,
}

impl RowIndex {
    pub fn new(rows: Vec<Row>) -> Self {
        let by_key = rows.iter().enumerate().map(|(i, r)| (r.key, i)).collect();
        Self { rows, by_key }
    }

    pub fn get(&self, key: ItemKey) -> Option<&Row> {
        self.by_key.get(&key).map(|&i| &self.rows[i])
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn total_height(&self) -> f32 {
        total_height(&self.rows)
    }

    /// The row under a y coordinate, if any.
    pub fn row_at(&self, y: f32) -> Option<&Row> {
        let idx = self.rows.partition_point(|r| r.bottom() <= y);
        self.rows.get(idx).filter(|r| r.y <= y)
    }
}
