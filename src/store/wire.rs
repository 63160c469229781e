//! Record shapes of the schedule backend and their conversion into the
//! engine's model types.
//!
//! The backend speaks Spanish field names (`nombre`, `fechaInicio`, …). Each
//! record is decoded on its own so a single malformed row only drops that
//! row.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::model::{
    BaselineMap, DateFields, DateSpan, Dependency, DependencyKind, ItemKey, Level, ScheduleInfo,
    ScheduleItem, ScheduleKind,
};

/// Field holding the parent id, per level.
fn parent_field(level: Level) -> Option<&'static str> {
    match level {
        Level::Phase => None,
        Level::WorkPackage => Some("faseId"),
        Level::Task => Some("edtId"),
        Level::Subtask => Some("tareaId"),
    }
}

/// Phases and work packages carry planned-date fields; tasks and subtasks
/// use plain start/end.
fn uses_planned_fields(level: Level) -> bool {
    matches!(level, Level::Phase | Level::WorkPackage)
}

/// Parse a date in any of the formats the backend has been seen to emit.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

fn date_field(record: &Value, keys: &[&str]) -> Option<NaiveDate> {
    keys.iter()
        .filter_map(|k| record.get(*k).and_then(Value::as_str))
        .find_map(parse_date)
}

fn id_field(record: &Value, key: &str) -> Option<i64> {
    match record.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        // Some endpoints embed the parent object instead of its id.
        Value::Object(o) => o.get("id").and_then(Value::as_i64),
        _ => None,
    }
}

fn text_field(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match record.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(o) => o.get("nombre").and_then(Value::as_str).map(str::to_string),
        _ => None,
    })
}

fn number_field(record: &Value, keys: &[&str]) -> Option<f32> {
    keys.iter().find_map(|k| match record.get(*k)? {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    })
}

/// Decode one hierarchy record. `None` when it has no usable id.
pub fn item_from_record(level: Level, record: &Value) -> Option<ScheduleItem> {
    let id = id_field(record, "id")?;
    let name = text_field(record, &["nombre", "name"]).unwrap_or_else(|| format!("{} {}", level.label(), id));

    let planned_keys: (&[&str], &[&str]) = if uses_planned_fields(level) {
        (
            &["fechaInicioPlanificada", "fechaInicio"],
            &["fechaFinPlanificada", "fechaFin"],
        )
    } else {
        (
            &["fechaInicio", "fechaInicioPlanificada"],
            &["fechaFin", "fechaFinPlanificada"],
        )
    };

    let mut item = ScheduleItem::new(ItemKey::new(level, id), name);
    item.parent = parent_field(level).and_then(|f| id_field(record, f).or_else(|| id_field(record, "parentId")));
    item.planned_start = date_field(record, planned_keys.0);
    item.planned_end = date_field(record, planned_keys.1);
    item.actual_start = date_field(record, &["fechaInicioReal"]);
    item.actual_end = date_field(record, &["fechaFinReal"]);
    item.progress = number_field(record, &["porcentajeAvance", "avance", "progreso"])
        .unwrap_or(0.0)
        .clamp(0.0, 100.0);
    item.responsible = text_field(record, &["responsable", "responsible"]);
    Some(item)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDependency {
    id: i64,
    #[serde(alias = "fromTaskId", alias = "predecesoraId")]
    tarea_origen_id: i64,
    #[serde(alias = "toTaskId", alias = "sucesoraId")]
    tarea_destino_id: i64,
    #[serde(alias = "type", default)]
    tipo: Option<DependencyKind>,
}

/// Normalise a dependency record into `{id, from, to, kind}`. Endpoints are
/// task-level items. Self-loops are rejected.
pub fn dependency_from_record(record: &Value) -> Option<Dependency> {
    let wire: WireDependency = serde_json::from_value(record.clone()).ok()?;
    if wire.tarea_origen_id == wire.tarea_destino_id {
        return None;
    }
    Some(Dependency {
        id: wire.id,
        from: ItemKey::task(wire.tarea_origen_id),
        to: ItemKey::task(wire.tarea_destino_id),
        kind: wire.tipo.unwrap_or(DependencyKind::FinishToStart),
    })
}

/// Decode a schedule header record.
pub fn schedule_from_record(record: &Value) -> Option<ScheduleInfo> {
    let id = id_field(record, "id")?;
    let kind = match text_field(record, &["tipo", "kind"]).unwrap_or_default().to_lowercase().as_str() {
        "ejecucion" | "ejecución" | "execution" => ScheduleKind::Execution,
        _ => ScheduleKind::Planning,
    };
    Some(ScheduleInfo {
        id,
        name: text_field(record, &["nombre", "name"]).unwrap_or_else(|| format!("Schedule {id}")),
        kind,
        baseline_id: id_field(record, "lineaBaseId").or_else(|| id_field(record, "cronogramaBaseId")),
    })
}

const TREE_CHILD_KEYS: [&str; 5] = ["fases", "edts", "tareas", "subtareas", "children"];

/// Flatten a baseline schedule tree into a name-keyed map, depth first.
pub fn flatten_baseline(tree: &Value) -> BaselineMap {
    let mut map = BaselineMap::new();
    let roots = match tree {
        Value::Object(o) if o.contains_key("data") => &o["data"],
        other => other,
    };
    visit(roots, &mut map);
    map
}

fn visit(node: &Value, map: &mut BaselineMap) {
    match node {
        Value::Array(nodes) => nodes.iter().for_each(|n| visit(n, map)),
        Value::Object(_) => {
            let name = text_field(node, &["nombre", "name"]);
            let start = date_field(node, &["fechaInicioPlanificada", "fechaInicio"]);
            let end = date_field(node, &["fechaFinPlanificada", "fechaFin"]);
            if let (Some(name), Some(start), Some(end)) = (name, start, end) {
                if start <= end {
                    map.insert_first(name, DateSpan::new(start, end));
                }
            }
            for key in TREE_CHILD_KEYS {
                if let Some(children) = node.get(key) {
                    visit(children, map);
                }
            }
        }
        _ => {}
    }
}

/// PATCH body for writing new dates into `fields` on `level`.
pub fn patch_body(level: Level, fields: DateFields, span: DateSpan) -> Value {
    let start = span.start.format("%Y-%m-%d").to_string();
    let end = span.end.format("%Y-%m-%d").to_string();
    if fields == DateFields::Actual {
        json!({ "fechaInicioReal": start, "fechaFinReal": end })
    } else if uses_planned_fields(level) {
        json!({ "fechaInicioPlanificada": start, "fechaFinPlanificada": end })
    } else {
        json!({ "fechaInicio": start, "fechaFin": end })
    }
}
