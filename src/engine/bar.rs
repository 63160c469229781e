use chrono::NaiveDate;

use super::drag::DragHandle;
use super::geometry::Point;
use super::layout::Row;
use crate::model::{DateSpan, ItemKey, Level, ScheduleItem, TimelineModel};

/// Vertical gap between the row edges and the bar.
pub const BAR_INSET: f32 = 6.0;
/// Width of the resize affordance at each end of a bar.
pub const EDGE_HIT_ZONE: f32 = 3.0;
/// Height of the faint baseline bar.
pub const BASELINE_HEIGHT: f32 = 4.0;

/// Pixel placement of one task bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub key: ItemKey,
    pub x: f32,
    pub width: f32,
    pub y: f32,
    pub height: f32,
    pub mid_y: f32,
    /// Width of the progress fill, from the left edge.
    pub progress_width: f32,
    pub overdue: bool,
}

impl BarGeometry {
    pub fn level(&self) -> Level {
        self.key.level
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn start_point(&self) -> Point {
        Point::new(self.left(), self.mid_y)
    }

    pub fn finish_point(&self) -> Point {
        Point::new(self.right(), self.mid_y)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() - EDGE_HIT_ZONE
            && p.x <= self.right() + EDGE_HIT_ZONE
            && p.y >= self.y
            && p.y <= self.y + self.height
    }
}

/// Place `item` on `row`. `None` when the item has no usable dates.
pub fn bar_geometry(
    item: &ScheduleItem,
    row: &Row,
    timeline: &TimelineModel,
    today: NaiveDate,
) -> Option<BarGeometry> {
    let span = item.display_span()?;
    Some(place(item, span, row, timeline, today))
}

/// Like [`bar_geometry`] but with an explicit span, for drag previews.
pub fn bar_geometry_for_span(
    item: &ScheduleItem,
    span: DateSpan,
    row: &Row,
    timeline: &TimelineModel,
    today: NaiveDate,
) -> BarGeometry {
    place(item, span, row, timeline, today)
}

fn place(
    item: &ScheduleItem,
    span: DateSpan,
    row: &Row,
    timeline: &TimelineModel,
    today: NaiveDate,
) -> BarGeometry {
    let x = timeline.date_to_x(span.start);
    let width = (timeline.date_to_x(span.end) - x).max(0.0);
    let progress = item.progress.clamp(0.0, 100.0) / 100.0;
    BarGeometry {
        key: item.key,
        x,
        width,
        y: row.y + BAR_INSET,
        height: (row.height - BAR_INSET * 2.0).max(2.0),
        mid_y: row.mid_y(),
        progress_width: width * progress,
        overdue: item.progress < 100.0 && span.end < today,
    }
}

/// Geometry of the faint baseline bar drawn in the lower part of a row.
pub fn baseline_geometry(span: DateSpan, row: &Row, timeline: &TimelineModel) -> (Point, Point) {
    let y = row.bottom() - BAR_INSET / 2.0 - BASELINE_HEIGHT;
    let x0 = timeline.date_to_x(span.start);
    let x1 = timeline.date_to_x(span.end).max(x0);
    (Point::new(x0, y), Point::new(x1, y + BASELINE_HEIGHT))
}

/// Which drag handle a pointer-down at `pointer_x` grabs.
///
/// The edge zones win over the body. Bars narrower than both zones keep
/// their own width for moving and resize only from just outside.
pub fn hit_test(bar: &BarGeometry, pointer_x: f32) -> DragHandle {
    if bar.width < 2.0 * EDGE_HIT_ZONE {
        return if pointer_x < bar.left() {
            DragHandle::Start
        } else if pointer_x > bar.right() {
            DragHandle::End
        } else {
            DragHandle::Move
        };
    }
    let from_left = (pointer_x - bar.left()).abs();
    let from_right = (pointer_x - bar.right()).abs();
    if from_left <= EDGE_HIT_ZONE || from_right <= EDGE_HIT_ZONE {
        if from_left <= from_right {
            DragHandle::Start
        } else {
            DragHandle::End
        }
    } else {
        DragHandle::Move
    }
}
