//! Pure chart engine: row layout, bar placement, drag handling, dependency
//! connectors and the axis. Nothing in here knows about egui.

pub mod axis;
pub mod bar;
pub mod dependency;
pub mod drag;
pub mod gantt;
pub mod geometry;
pub mod layout;

pub use bar::BarGeometry;
pub use dependency::Connector;
pub use drag::{DragHandle, DragOutcome, TaskBarDrag};
pub use gantt::{GanttEngine, LoadSummary};
pub use geometry::Point;
pub use layout::{ExpandedSet, Row};
