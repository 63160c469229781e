//! Pointer-drag state machine for moving and resizing task bars.
//!
//! `Idle → Dragging(handle) → Idle`. The UI feeds pointer events through
//! [`TaskBarDrag::on_down`], [`TaskBarDrag::on_move`] and
//! [`TaskBarDrag::on_up`]; nothing here knows about a windowing toolkit.

use chrono::Duration;

use crate::model::{DateSpan, HistoryKind, ItemKey};

/// Which part of the bar is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragHandle {
    /// The body: both dates shift together.
    Move,
    /// The left edge: only the start changes.
    Start,
    /// The right edge: only the end changes.
    End,
}

/// A drag in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub item: ItemKey,
    pub handle: DragHandle,
    pub start_x: f32,
    pub original: DateSpan,
    pub pixels_per_day: f32,
    /// The latest candidate dates. Drawn live, not yet committed.
    pub current: DateSpan,
}

impl DragSession {
    fn candidate(&self, x: f32) -> DateSpan {
        let days = day_delta(x - self.start_x, self.pixels_per_day);
        apply_delta(self.original, self.handle, days)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// The result of releasing the pointer: dates to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragOutcome {
    pub item: ItemKey,
    pub handle: DragHandle,
    pub previous: DateSpan,
    pub new: DateSpan,
}

impl DragOutcome {
    pub fn is_resize(&self) -> bool {
        self.handle != DragHandle::Move
    }

    pub fn history_kind(&self) -> HistoryKind {
        if self.is_resize() {
            HistoryKind::Resize
        } else {
            HistoryKind::Move
        }
    }
}

/// Whole days for a horizontal pixel delta.
pub fn day_delta(delta_x: f32, pixels_per_day: f32) -> i64 {
    if pixels_per_day <= 0.0 {
        return 0;
    }
    (delta_x / pixels_per_day).round() as i64
}

/// Apply a day delta to `original` for `handle`, keeping at least one day
/// between start and end on resizes.
pub fn apply_delta(original: DateSpan, handle: DragHandle, days: i64) -> DateSpan {
    let one_day = Duration::days(1);
    match handle {
        DragHandle::Move => original.shifted(days),
        DragHandle::Start => {
            let start = (original.start + Duration::days(days)).min(original.end - one_day);
            DateSpan::new(start, original.end)
        }
        DragHandle::End => {
            let end = (original.end + Duration::days(days)).max(original.start + one_day);
            DateSpan::new(original.start, end)
        }
    }
}

/// Drag controller for the whole chart. At most one bar is dragged at a time.
#[derive(Debug, Clone, Default)]
pub struct TaskBarDrag {
    state: DragState,
}

impl TaskBarDrag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Pointer pressed on a bar. Replaces any drag already in flight.
    pub fn on_down(
        &mut self,
        item: ItemKey,
        handle: DragHandle,
        x: f32,
        original: DateSpan,
        pixels_per_day: f32,
    ) {
        self.state = DragState::Dragging(DragSession {
            item,
            handle,
            start_x: x,
            original,
            pixels_per_day,
            current: original,
        });
    }

    /// Pointer moved. Returns the live candidate dates while dragging.
    pub fn on_move(&mut self, x: f32) -> Option<DateSpan> {
        match &mut self.state {
            DragState::Dragging(session) => {
                session.current = session.candidate(x);
                Some(session.current)
            }
            DragState::Idle => None,
        }
    }

    /// Pointer released, anywhere. Yields the dates to commit, or `None`
    /// when nothing changed.
    pub fn on_up(&mut self) -> Option<DragOutcome> {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return None;
        };
        if session.current == session.original {
            return None;
        }
        Some(DragOutcome {
            item: session.item,
            handle: session.handle,
            previous: session.original,
            new: session.current,
        })
    }

    /// Abort the drag. The bar snaps back to its original dates.
    pub fn on_cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Candidate dates for `key` if it is the bar being dragged.
    pub fn preview(&self, key: ItemKey) -> Option<DateSpan> {
        match &self.state {
            DragState::Dragging(session) if session.item == key => Some(session.current),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    fn span(start: u32, end: u32) -> DateSpan {
        DateSpan::new(d(start), d(end))
    }

    #[test]
    fn moving_shifts_both_dates_by_rounded_days() {
        let mut drag = TaskBarDrag::new();
        // Weeks scale: 20 px per week.
        let ppd = 20.0 / 7.0;
        drag.on_down(ItemKey::task(7), DragHandle::Move, 500.0, span(8, 12), ppd);
        assert!(drag.is_dragging());
        assert_eq!(drag.on_move(503.0), Some(span(9, 13)));

        let outcome = drag.on_up().unwrap();
        assert_eq!(outcome.previous, span(8, 12));
        assert_eq!(outcome.new, span(9, 13));
        assert_eq!(outcome.history_kind(), HistoryKind::Move);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn start_edge_cannot_pass_the_end_minus_one_day() {
        let original = span(10, 15);
        assert_eq!(apply_delta(original, DragHandle::Start, -3), span(7, 15));
        assert_eq!(apply_delta(original, DragHandle::Start, 4), span(14, 15));
        assert_eq!(apply_delta(original, DragHandle::Start, 40), span(14, 15));
    }

    #[test]
    fn end_edge_cannot_pass_the_start_plus_one_day() {
        let original = span(10, 15);
        assert_eq!(apply_delta(original, DragHandle::End, 2), span(10, 17));
        assert_eq!(apply_delta(original, DragHandle::End, -5), span(10, 11));
        assert_eq!(apply_delta(original, DragHandle::End, -30), span(10, 11));
    }

    #[test]
    fn resizes_always_keep_at_least_one_day() {
        for days in -20..20 {
            for handle in [DragHandle::Start, DragHandle::End] {
                let result = apply_delta(span(10, 12), handle, days);
                assert!(result.days() >= 1, "{handle:?} by {days} gave {result:?}");
            }
        }
    }

    #[test]
    fn releasing_without_a_delta_commits_nothing() {
        let mut drag = TaskBarDrag::new();
        drag.on_down(ItemKey::task(1), DragHandle::End, 100.0, span(1, 3), 40.0);
        drag.on_move(110.0);
        assert_eq!(drag.on_up(), None);
        assert_eq!(drag.on_up(), None);
    }

    #[test]
    fn cancel_reverts_and_drops_the_candidate() {
        let mut drag = TaskBarDrag::new();
        drag.on_down(ItemKey::task(1), DragHandle::Move, 0.0, span(1, 3), 40.0);
        drag.on_move(200.0);
        assert_eq!(drag.preview(ItemKey::task(1)), Some(span(6, 8)));
        drag.on_cancel();
        assert_eq!(drag.preview(ItemKey::task(1)), None);
        assert_eq!(drag.on_up(), None);
        assert_eq!(drag.on_move(300.0), None);
    }

    #[test]
    fn preview_only_applies_to_the_dragged_item() {
        let mut drag = TaskBarDrag::new();
        drag.on_down(ItemKey::task(1), DragHandle::Start, 0.0, span(5, 9), 40.0);
        drag.on_move(-80.0);
        assert_eq!(drag.preview(ItemKey::task(1)), Some(span(3, 9)));
        assert_eq!(drag.preview(ItemKey::subtask(1)), None);
    }
}
