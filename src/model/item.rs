use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// The four fixed hierarchy levels of a schedule, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    Phase,
    WorkPackage,
    Task,
    Subtask,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Phase, Level::WorkPackage, Level::Task, Level::Subtask];

    /// 1 for phases down to 4 for subtasks.
    pub fn depth(self) -> u8 {
        match self {
            Level::Phase => 1,
            Level::WorkPackage => 2,
            Level::Task => 3,
            Level::Subtask => 4,
        }
    }

    /// Row height in pixels. Deeper levels get slimmer rows.
    pub fn row_height(self) -> f32 {
        match self {
            Level::Phase => 45.0,
            Level::WorkPackage => 40.0,
            Level::Task => 35.0,
            Level::Subtask => 30.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Level::Phase => "Phase",
            Level::WorkPackage => "Work package",
            Level::Task => "Task",
            Level::Subtask => "Subtask",
        }
    }

    /// The level directly below this one, if any.
    pub fn child(self) -> Option<Level> {
        match self {
            Level::Phase => Some(Level::WorkPackage),
            Level::WorkPackage => Some(Level::Task),
            Level::Task => Some(Level::Subtask),
            Level::Subtask => None,
        }
    }
}

/// Identity of a schedule item. Ids are only unique within a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub level: Level,
    pub id: i64,
}

impl ItemKey {
    pub fn new(level: Level, id: i64) -> Self {
        Self { level, id }
    }

    pub fn phase(id: i64) -> Self {
        Self::new(Level::Phase, id)
    }

    pub fn work_package(id: i64) -> Self {
        Self::new(Level::WorkPackage, id)
    }

    pub fn task(id: i64) -> Self {
        Self::new(Level::Task, id)
    }

    pub fn subtask(id: i64) -> Self {
        Self::new(Level::Subtask, id)
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.level.label().to_lowercase(), self.id)
    }
}

/// An inclusive pair of dates. `start <= end` is expected but not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn shifted(&self, days: i64) -> Self {
        Self {
            start: self.start + Duration::days(days),
            end: self.end + Duration::days(days),
        }
    }
}

/// Which pair of date fields an edit reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateFields {
    Planned,
    Actual,
}

/// A schedulable node at one of the four hierarchy levels.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleItem {
    pub key: ItemKey,
    pub name: String,
    /// Id of the parent one level up (phase for a work package, and so on).
    pub parent: Option<i64>,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub actual_start: Option<NaiveDate>,
    pub actual_end: Option<NaiveDate>,
    /// Percent complete, 0 to 100.
    pub progress: f32,
    pub responsible: Option<String>,
}

impl ScheduleItem {
    pub fn new(key: ItemKey, name: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            parent: None,
            planned_start: None,
            planned_end: None,
            actual_start: None,
            actual_end: None,
            progress: 0.0,
            responsible: None,
        }
    }

    pub fn with_parent(mut self, parent: i64) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_planned(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.planned_start = Some(start);
        self.planned_end = Some(end);
        self
    }

    pub fn with_actual(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.actual_start = Some(start);
        self.actual_end = Some(end);
        self
    }

    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = progress.clamp(0.0, 100.0);
        self
    }

    pub fn level(&self) -> Level {
        self.key.level
    }

    /// The fields the bar is drawn from: actual dates when both are
    /// present, otherwise planned. Edits write back to the same pair.
    pub fn displayed_fields(&self) -> DateFields {
        match (self.actual_start, self.actual_end) {
            (Some(_), Some(_)) => DateFields::Actual,
            _ => DateFields::Planned,
        }
    }

    pub fn span_of(&self, fields: DateFields) -> Option<DateSpan> {
        let (start, end) = match fields {
            DateFields::Planned => (self.planned_start?, self.planned_end?),
            DateFields::Actual => (self.actual_start?, self.actual_end?),
        };
        if end < start {
            return None;
        }
        Some(DateSpan::new(start, end))
    }

    /// The span used for positioning. `None` means the item cannot be drawn.
    pub fn display_span(&self) -> Option<DateSpan> {
        self.span_of(self.displayed_fields())
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.progress < 100.0 && self.display_span().is_some_and(|s| s.end < today)
    }

    /// Every known date on the item, used to fit the timeline window.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        [
            self.planned_start,
            self.planned_end,
            self.actual_start,
            self.actual_end,
        ]
        .into_iter()
        .flatten()
    }
}

/// Which endpoints of the two linked items a dependency attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    #[serde(alias = "FS")]
    FinishToStart,
    #[serde(alias = "SS")]
    StartToStart,
    #[serde(alias = "FF")]
    FinishToFinish,
    #[serde(alias = "SF")]
    StartToFinish,
}

impl DependencyKind {
    /// Whether the connector leaves the predecessor at its finish edge.
    pub fn from_finish(self) -> bool {
        matches!(self, DependencyKind::FinishToStart | DependencyKind::FinishToFinish)
    }

    /// Whether the connector enters the successor at its finish edge.
    pub fn to_finish(self) -> bool {
        matches!(self, DependencyKind::FinishToFinish | DependencyKind::StartToFinish)
    }

    pub fn short_label(self) -> &'static str {
        match self {
            DependencyKind::FinishToStart => "FS",
            DependencyKind::StartToStart => "SS",
            DependencyKind::FinishToFinish => "FF",
            DependencyKind::StartToFinish => "SF",
        }
    }
}

/// A directed link between two items. Cycles are the caller's business.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub id: i64,
    pub from: ItemKey,
    pub to: ItemKey,
    pub kind: DependencyKind,
}

/// The four hierarchy collections of one schedule, in source order.
#[derive(Debug, Clone, Default)]
pub struct ScheduleItems {
    pub phases: Vec<ScheduleItem>,
    pub work_packages: Vec<ScheduleItem>,
    pub tasks: Vec<ScheduleItem>,
    pub subtasks: Vec<ScheduleItem>,
}

impl ScheduleItems {
    pub fn collection(&self, level: Level) -> &[ScheduleItem] {
        match level {
            Level::Phase => &self.phases,
            Level::WorkPackage => &self.work_packages,
            Level::Task => &self.tasks,
            Level::Subtask => &self.subtasks,
        }
    }

    pub fn collection_mut(&mut self, level: Level) -> &mut Vec<ScheduleItem> {
        match level {
            Level::Phase => &mut self.phases,
            Level::WorkPackage => &mut self.work_packages,
            Level::Task => &mut self.tasks,
            Level::Subtask => &mut self.subtasks,
        }
    }

    pub fn get(&self, key: ItemKey) -> Option<&ScheduleItem> {
        self.collection(key.level).iter().find(|i| i.key.id == key.id)
    }

    /// Direct children of `key`, in source order.
    pub fn children_of(&self, key: ItemKey) -> impl Iterator<Item = &ScheduleItem> + '_ {
        let children: &[ScheduleItem] = match key.level.child() {
            Some(level) => self.collection(level),
            None => &[],
        };
        children.iter().filter(move |c| c.parent == Some(key.id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduleItem> + '_ {
        Level::ALL.into_iter().flat_map(|l| self.collection(l).iter())
    }

    pub fn all_dates(&self) -> Vec<NaiveDate> {
        self.iter().flat_map(|i| i.dates()).collect()
    }

    pub fn len(&self) -> usize {
        Level::ALL.iter().map(|l| self.collection(*l).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn actual_dates_take_precedence_when_complete() {
        let item = ScheduleItem::new(ItemKey::task(1), "Pour slab")
            .with_planned(d(2024, 1, 1), d(2024, 1, 10))
            .with_actual(d(2024, 1, 3), d(2024, 1, 12));
        assert_eq!(item.display_span(), Some(DateSpan::new(d(2024, 1, 3), d(2024, 1, 12))));

        assert_eq!(item.displayed_fields(), DateFields::Actual);

        let mut partial = item.clone();
        partial.actual_end = None;
        assert_eq!(partial.displayed_fields(), DateFields::Planned);
        assert_eq!(partial.display_span(), Some(DateSpan::new(d(2024, 1, 1), d(2024, 1, 10))));
    }

    #[test]
    fn missing_or_inverted_dates_are_not_drawable() {
        let mut item = ScheduleItem::new(ItemKey::task(1), "No dates");
        assert_eq!(item.display_span(), None);
        item.planned_start = Some(d(2024, 1, 5));
        assert_eq!(item.display_span(), None);
        item.planned_end = Some(d(2024, 1, 1));
        assert_eq!(item.display_span(), None);
    }

    #[test]
    fn overdue_requires_unfinished_work_past_its_end() {
        let item = ScheduleItem::new(ItemKey::task(1), "Late")
            .with_planned(d(2024, 1, 1), d(2024, 1, 10))
            .with_progress(40.0);
        assert!(item.is_overdue(d(2024, 1, 11)));
        assert!(!item.is_overdue(d(2024, 1, 10)));
        assert!(!item.clone().with_progress(100.0).is_overdue(d(2024, 2, 1)));
    }

    #[test]
    fn children_are_matched_by_parent_id_one_level_down() {
        let items = ScheduleItems {
            phases: vec![ScheduleItem::new(ItemKey::phase(1), "P")],
            work_packages: vec![
                ScheduleItem::new(ItemKey::work_package(10), "A").with_parent(1),
                ScheduleItem::new(ItemKey::work_package(11), "B").with_parent(2),
            ],
            // Same numeric id as the phase, different level.
            tasks: vec![ScheduleItem::new(ItemKey::task(1), "T").with_parent(10)],
            subtasks: vec![],
        };
        let names: Vec<_> = items.children_of(ItemKey::phase(1)).map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A"]);
        assert_eq!(items.get(ItemKey::task(1)).map(|t| t.name.as_str()), Some("T"));
        assert_eq!(items.children_of(ItemKey::subtask(1)).count(), 0);
    }

    #[test]
    fn dependency_kind_accepts_short_wire_names() {
        let kind: DependencyKind = serde_json::from_str("\"SF\"").unwrap();
        assert_eq!(kind, DependencyKind::StartToFinish);
        let kind: DependencyKind = serde_json::from_str("\"finish_to_finish\"").unwrap();
        assert!(kind.from_finish() && kind.to_finish());
    }
}
