use super::item::{DateFields, DateSpan, ItemKey};

/// Maximum number of actions kept on the undo stack.
const MAX_HISTORY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Move,
    Resize,
}

/// One committed schedule edit. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryAction {
    pub kind: HistoryKind,
    pub item: ItemKey,
    pub fields: DateFields,
    pub previous: DateSpan,
    pub new: DateSpan,
}

/// Dates the caller should write back to replay an undo or redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStep {
    pub item: ItemKey,
    pub fields: DateFields,
    pub dates: DateSpan,
}

/// Session-local undo/redo stacks of schedule edits.
///
/// Pure data: replaying a step against persistence is the caller's job.
#[derive(Debug, Default)]
pub struct HistoryStack {
    past: Vec<HistoryAction>,
    future: Vec<HistoryAction>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new action. Any redo path is discarded.
    pub fn record(&mut self, action: HistoryAction) {
        self.past.push(action);
        if self.past.len() > MAX_HISTORY {
            self.past.remove(0);
        }
        self.future.clear();
    }

    /// Step back one action, returning the dates it replaced.
    pub fn undo(&mut self) -> Option<ReplayStep> {
        let action = self.past.pop()?;
        let step = ReplayStep {
            item: action.item,
            fields: action.fields,
            dates: action.previous,
        };
        self.future.push(action);
        Some(step)
    }

    /// Re-apply the most recently undone action, returning its dates.
    pub fn redo(&mut self) -> Option<ReplayStep> {
        let action = self.future.pop()?;
        let step = ReplayStep {
            item: action.item,
            fields: action.fields,
            dates: action.new,
        };
        self.past.push(action);
        Some(step)
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    /// The action the next `undo` would revert.
    pub fn last(&self) -> Option<&HistoryAction> {
        self.past.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn span(start: u32, end: u32) -> DateSpan {
        DateSpan::new(
            NaiveDate::from_ymd_opt(2024, 3, start).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, end).unwrap(),
        )
    }

    fn action(id: i64, previous: DateSpan, new: DateSpan) -> HistoryAction {
        HistoryAction {
            kind: HistoryKind::Move,
            item: ItemKey::task(id),
            fields: DateFields::Planned,
            previous,
            new,
        }
    }

    #[test]
    fn undo_then_redo_replays_previous_then_new_dates() {
        let mut history = HistoryStack::new();
        history.record(action(1, span(1, 5), span(3, 7)));
        history.record(action(1, span(3, 7), span(3, 9)));

        let undo = history.undo().unwrap();
        assert_eq!(undo.dates, span(3, 7));
        let undo = history.undo().unwrap();
        assert_eq!(undo.dates, span(1, 5));
        assert!(history.undo().is_none());

        assert_eq!(history.redo().unwrap().dates, span(3, 7));
        assert_eq!(history.redo().unwrap().dates, span(3, 9));
        assert!(history.redo().is_none());
    }

    #[test]
    fn recording_after_undo_drops_the_redo_path() {
        let mut history = HistoryStack::new();
        history.record(action(1, span(1, 5), span(2, 6)));
        history.undo();
        assert!(history.can_redo());
        history.record(action(2, span(10, 12), span(11, 13)));
        assert!(history.redo().is_none());
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn clear_empties_both_stacks() {
        let mut history = HistoryStack::new();
        history.record(action(1, span(1, 5), span(2, 6)));
        history.record(action(1, span(2, 6), span(3, 7)));
        history.undo();
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn oldest_actions_fall_off_past_the_limit() {
        let mut history = HistoryStack::new();
        for i in 0..(MAX_HISTORY as i64 + 5) {
            history.record(action(i, span(1, 2), span(2, 3)));
        }
        assert_eq!(history.undo_len(), MAX_HISTORY);
        assert_eq!(history.last().map(|a| a.item.id), Some(MAX_HISTORY as i64 + 4));
    }
}
