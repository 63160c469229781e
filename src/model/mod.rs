pub mod baseline;
pub mod history;
pub mod item;
pub mod timeline;

pub use baseline::{BaselineMap, ScheduleInfo, ScheduleKind};
pub use history::{HistoryAction, HistoryKind, HistoryStack, ReplayStep};
pub use item::{DateFields, DateSpan, Dependency, DependencyKind, ItemKey, Level, ScheduleItem, ScheduleItems};
pub use timeline::{TimelineModel, TimelineScale};
