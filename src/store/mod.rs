//! Persistence collaborators.
//!
//! The engine only ever reads whole collections and writes date pairs back
//! by item. Everything behind [`ScheduleStore`] is a black box: a REST
//! backend, a folder of JSON documents, or an in-memory fixture.

pub mod file;
pub mod memory;
pub mod rest;
pub mod wire;

use serde_json::Value;
use tracing::warn;

use crate::error::StoreResult;
use crate::model::{DateFields, DateSpan, ItemKey, Level, ScheduleInfo};

pub use file::FileStore;
pub use memory::MemoryStore;
pub use rest::RestStore;

/// A collection the engine reads on every load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Phases,
    WorkPackages,
    Tasks,
    Subtasks,
    Dependencies,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Phases,
        Collection::WorkPackages,
        Collection::Tasks,
        Collection::Subtasks,
        Collection::Dependencies,
    ];

    /// Resource name on the backend; also the JSON file stem on disk.
    pub fn path(self) -> &'static str {
        match self {
            Collection::Phases => "fases",
            Collection::WorkPackages => "edts",
            Collection::Tasks => "tareas",
            Collection::Subtasks => "subtareas",
            Collection::Dependencies => "dependencias",
        }
    }

    pub fn for_level(level: Level) -> Self {
        match level {
            Level::Phase => Collection::Phases,
            Level::WorkPackage => Collection::WorkPackages,
            Level::Task => Collection::Tasks,
            Level::Subtask => Collection::Subtasks,
        }
    }

    /// Whether the collection is filtered by schedule as well as project.
    pub fn schedule_scoped(self) -> bool {
        self != Collection::Dependencies
    }
}

/// Which project and schedule a load is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scope {
    pub project_id: i64,
    pub schedule_id: Option<i64>,
}

impl Scope {
    pub fn new(project_id: i64, schedule_id: Option<i64>) -> Self {
        Self {
            project_id,
            schedule_id,
        }
    }
}

/// Read/write contract of the schedule backend.
pub trait ScheduleStore {
    /// Raw records of one collection. The shape is not trusted: callers run
    /// the result through [`coerce_records`].
    fn fetch(&self, collection: Collection, scope: &Scope) -> StoreResult<Value>;

    /// Write new dates into one pair of date fields of an item.
    fn patch_dates(&mut self, item: ItemKey, fields: DateFields, dates: DateSpan) -> StoreResult<()>;

    /// Header of a schedule, if it exists.
    fn fetch_schedule(&self, schedule_id: i64) -> StoreResult<Option<ScheduleInfo>>;

    /// Nested phase → work package → task → subtask tree of a schedule.
    fn fetch_baseline_tree(&self, schedule_id: i64) -> StoreResult<Value>;

    /// Short description for the status bar.
    fn describe(&self) -> String;
}

impl<S: ScheduleStore + ?Sized> ScheduleStore for Box<S> {
    fn fetch(&self, collection: Collection, scope: &Scope) -> StoreResult<Value> {
        (**self).fetch(collection, scope)
    }

    fn patch_dates(&mut self, item: ItemKey, fields: DateFields, dates: DateSpan) -> StoreResult<()> {
        (**self).patch_dates(item, fields, dates)
    }

    fn fetch_schedule(&self, schedule_id: i64) -> StoreResult<Option<ScheduleInfo>> {
        (**self).fetch_schedule(schedule_id)
    }

    fn fetch_baseline_tree(&self, schedule_id: i64) -> StoreResult<Value> {
        (**self).fetch_baseline_tree(schedule_id)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Accept either a bare array or `{ "data": [...] }`. Anything else is
/// treated as an empty collection.
pub fn coerce_records(value: Value, what: &str) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(items)) => items,
            other => {
                warn!(collection = what, data = ?other.map(|v| kind_of(&v)), "response is not a list, using empty");
                Vec::new()
            }
        },
        Value::Null => Vec::new(),
        other => {
            warn!(collection = what, kind = kind_of(&other), "response is not a list, using empty");
            Vec::new()
        }
    }
}

/// Whether a raw record belongs to `scope`. Records without scope fields
/// are kept.
pub fn in_scope(record: &Value, collection: Collection, scope: &Scope) -> bool {
    let field_is = |key: &str, expected: i64| match record.get(key) {
        Some(Value::Number(n)) => n.as_i64() == Some(expected),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok() == Some(expected),
        _ => true,
    };
    if !field_is("proyectoId", scope.project_id) {
        return false;
    }
    match scope.schedule_id {
        Some(schedule) if collection.schedule_scoped() => field_is("cronogramaId", schedule),
        _ => true,
    }
}

/// Merge the PATCH body for `item` into the matching record of `records`.
/// Returns `false` when no record has that id.
pub fn apply_patch(records: &mut [Value], item: ItemKey, fields: DateFields, dates: DateSpan) -> bool {
    let body = wire::patch_body(item.level, fields, dates);
    let Some(record) = records.iter_mut().find(|r| {
        r.get("id").and_then(Value::as_i64) == Some(item.id)
    }) else {
        return false;
    };
    if let (Value::Object(target), Value::Object(fields)) = (record, body) {
        target.extend(fields);
    }
    true
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
