use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::{apply_patch, in_scope, wire, Collection, ScheduleStore, Scope};
use crate::error::{StoreError, StoreResult};
use crate::model::{DateFields, DateSpan, ItemKey, ScheduleInfo};

const SCHEDULES_FILE: &str = "cronogramas.json";

/// A folder of JSON documents laid out like the backend's resources:
/// `fases.json`, `edts.json`, `tareas.json`, `subtareas.json`,
/// `dependencias.json`, `cronogramas.json` and one `arbol-{id}.json` per
/// frozen schedule tree.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.path()))
    }

    fn tree_path(&self, schedule_id: i64) -> PathBuf {
        self.dir.join(format!("arbol-{schedule_id}.json"))
    }

    /// Write a collection document, replacing what was there.
    pub fn save_collection(&self, collection: Collection, payload: &Value) -> StoreResult<()> {
        write_json(&self.collection_path(collection), payload)
    }
}

fn read_json(path: &Path) -> StoreResult<Value> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn write_json(path: &Path, value: &Value) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

impl ScheduleStore for FileStore {
    fn fetch(&self, collection: Collection, scope: &Scope) -> StoreResult<Value> {
        let path = self.collection_path(collection);
        if !path.exists() {
            debug!(path = %path.display(), "collection file missing");
            return Ok(Value::Array(Vec::new()));
        }
        Ok(match read_json(&path)? {
            Value::Array(records) => Value::Array(
                records
                    .into_iter()
                    .filter(|r| in_scope(r, collection, scope))
                    .collect(),
            ),
            other => other,
        })
    }

    fn patch_dates(&mut self, item: ItemKey, fields: DateFields, dates: DateSpan) -> StoreResult<()> {
        let path = self.collection_path(Collection::for_level(item.level));
        let mut doc = read_json(&path)?;
        let records = match &mut doc {
            Value::Array(records) => records,
            Value::Object(obj) => match obj.get_mut("data") {
                Some(Value::Array(records)) => records,
                _ => return Err(StoreError::NotFound(item.to_string())),
            },
            _ => return Err(StoreError::NotFound(item.to_string())),
        };
        if !apply_patch(records, item, fields, dates) {
            return Err(StoreError::NotFound(item.to_string()));
        }
        write_json(&path, &doc)?;
        debug!(%item, path = %path.display(), "dates written");
        Ok(())
    }

    fn fetch_schedule(&self, schedule_id: i64) -> StoreResult<Option<ScheduleInfo>> {
        let path = self.dir.join(SCHEDULES_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let records = super::coerce_records(read_json(&path)?, "cronogramas");
        Ok(records
            .iter()
            .filter_map(wire::schedule_from_record)
            .find(|s| s.id == schedule_id))
    }

    fn fetch_baseline_tree(&self, schedule_id: i64) -> StoreResult<Value> {
        let path = self.tree_path(schedule_id);
        if !path.exists() {
            return Err(StoreError::NotFound(path.display().to_string()));
        }
        read_json(&path)
    }

    fn describe(&self) -> String {
        format!("folder {}", self.dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn reads_scoped_records_and_writes_patches_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store
            .save_collection(
                Collection::Tasks,
                &json!([
                    { "id": 1, "cronogramaId": 5, "nombre": "Losa", "fechaInicio": "2024-01-01", "fechaFin": "2024-01-04" },
                    { "id": 2, "cronogramaId": 6, "nombre": "Muro" }
                ]),
            )
            .unwrap();

        let scope = Scope::new(1, Some(5));
        let tasks = store.fetch(Collection::Tasks, &scope).unwrap();
        assert_eq!(tasks.as_array().map(Vec::len), Some(1));
        assert_eq!(store.fetch(Collection::Phases, &scope).unwrap(), json!([]));

        let dates = DateSpan::new(
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
        );
        store.patch_dates(ItemKey::task(1), DateFields::Planned, dates).unwrap();
        let reread = store.fetch(Collection::Tasks, &scope).unwrap();
        assert_eq!(reread[0]["fechaInicio"], "2024-01-08");
        assert_eq!(reread[0]["fechaFin"], "2024-01-11");

        assert!(matches!(
            store.patch_dates(ItemKey::task(99), DateFields::Planned, dates),
            Err(StoreError::NotFound(_))
        ));
        assert!(store.patch_dates(ItemKey::phase(1), DateFields::Planned, dates).is_err());
    }

    #[test]
    fn schedules_and_trees_are_optional_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.fetch_schedule(1).unwrap(), None);
        assert!(store.fetch_baseline_tree(1).is_err());

        std::fs::write(
            dir.path().join(SCHEDULES_FILE),
            r#"{ "data": [{ "id": 3, "nombre": "Exec", "tipo": "ejecucion", "lineaBaseId": 1 }] }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("arbol-1.json"), "[]").unwrap();
        assert_eq!(store.fetch_schedule(3).unwrap().and_then(|s| s.baseline_id), Some(1));
        assert_eq!(store.fetch_baseline_tree(1).unwrap(), json!([]));
    }
}
