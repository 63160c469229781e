use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use super::{apply_patch, in_scope, wire, Collection, ScheduleStore, Scope};
use crate::error::{StoreError, StoreResult};
use crate::model::{DateFields, DateSpan, ItemKey, ScheduleInfo};

/// In-process store. Backs the demo schedule and the engine tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: HashMap<Collection, Value>,
    schedules: Vec<Value>,
    trees: HashMap<i64, Value>,
    patches: Vec<(ItemKey, DateSpan)>,
    failing_patches: bool,
    failing_reads: HashSet<Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the raw payload of a collection. Usually an array of records,
    /// but any JSON value is accepted so malformed responses can be simulated.
    pub fn with_collection(mut self, collection: Collection, payload: Value) -> Self {
        self.collections.insert(collection, payload);
        self
    }

    pub fn with_schedule(mut self, record: Value) -> Self {
        self.schedules.push(record);
        self
    }

    pub fn with_tree(mut self, schedule_id: i64, tree: Value) -> Self {
        self.trees.insert(schedule_id, tree);
        self
    }

    /// Make every subsequent write fail with a server error.
    pub fn set_failing_patches(&mut self, failing: bool) {
        self.failing_patches = failing;
    }

    /// Make reads of `collection` fail outright.
    pub fn set_failing_read(&mut self, collection: Collection) {
        self.failing_reads.insert(collection);
    }

    /// Every successful write, oldest first.
    pub fn patches(&self) -> &[(ItemKey, DateSpan)] {
        &self.patches
    }

    /// A small construction project: one execution schedule (id 2) derived
    /// from a frozen planning baseline (id 1), dated around `today`.
    pub fn sample(today: NaiveDate) -> Self {
        let day = |offset: i64| (today + Duration::days(offset)).format("%Y-%m-%d").to_string();
        let phases = json!([
            { "id": 1, "proyectoId": 1, "cronogramaId": 2, "nombre": "Design",
              "fechaInicioPlanificada": day(-20), "fechaFinPlanificada": day(5), "porcentajeAvance": 80 },
            { "id": 2, "proyectoId": 1, "cronogramaId": 2, "nombre": "Construction",
              "fechaInicioPlanificada": day(3), "fechaFinPlanificada": day(60), "porcentajeAvance": 10 }
        ]);
        let work_packages = json!([
            { "id": 1, "proyectoId": 1, "cronogramaId": 2, "faseId": 1, "nombre": "Drawings",
              "fechaInicioPlanificada": day(-20), "fechaFinPlanificada": day(0), "porcentajeAvance": 90 },
            { "id": 2, "proyectoId": 1, "cronogramaId": 2, "faseId": 1, "nombre": "Permits",
              "fechaInicioPlanificada": day(-5), "fechaFinPlanificada": day(5), "porcentajeAvance": 50 },
            { "id": 3, "proyectoId": 1, "cronogramaId": 2, "faseId": 2, "nombre": "Structure",
              "fechaInicioPlanificada": day(3), "fechaFinPlanificada": day(40), "porcentajeAvance": 5 },
            { "id": 4, "proyectoId": 1, "cronogramaId": 2, "faseId": 2, "nombre": "Finishes",
              "fechaInicioPlanificada": day(35), "fechaFinPlanificada": day(60) }
        ]);
        let tasks = json!([
            { "id": 1, "proyectoId": 1, "cronogramaId": 2, "edtId": 1, "nombre": "Site survey",
              "fechaInicio": day(-20), "fechaFin": day(-14), "fechaInicioReal": day(-19), "fechaFinReal": day(-12),
              "porcentajeAvance": 100, "responsable": "Surveyor" },
            { "id": 2, "proyectoId": 1, "cronogramaId": 2, "edtId": 1, "nombre": "Floor plans",
              "fechaInicio": day(-12), "fechaFin": day(-2), "porcentajeAvance": 85, "responsable": "Architect" },
            { "id": 3, "proyectoId": 1, "cronogramaId": 2, "edtId": 2, "nombre": "Building permit",
              "fechaInicio": day(-5), "fechaFin": day(5), "porcentajeAvance": 50, "responsable": "PM" },
            { "id": 4, "proyectoId": 1, "cronogramaId": 2, "edtId": 3, "nombre": "Foundations",
              "fechaInicio": day(3), "fechaFin": day(15), "porcentajeAvance": 0, "responsable": "Site lead" },
            { "id": 5, "proyectoId": 1, "cronogramaId": 2, "edtId": 3, "nombre": "Frame",
              "fechaInicio": day(15), "fechaFin": day(40), "responsable": "Site lead" },
            { "id": 6, "proyectoId": 1, "cronogramaId": 2, "edtId": 4, "nombre": "Interior",
              "fechaInicio": day(35), "fechaFin": day(60) }
        ]);
        let subtasks = json!([
            { "id": 1, "proyectoId": 1, "cronogramaId": 2, "tareaId": 4, "nombre": "Excavation",
              "fechaInicio": day(3), "fechaFin": day(7) },
            { "id": 2, "proyectoId": 1, "cronogramaId": 2, "tareaId": 4, "nombre": "Rebar",
              "fechaInicio": day(7), "fechaFin": day(11) },
            { "id": 3, "proyectoId": 1, "cronogramaId": 2, "tareaId": 4, "nombre": "Pour",
              "fechaInicio": day(11), "fechaFin": day(15) }
        ]);
        let dependencies = json!([
            { "id": 1, "proyectoId": 1, "tareaOrigenId": 1, "tareaDestinoId": 2, "tipo": "finish_to_start" },
            { "id": 2, "proyectoId": 1, "tareaOrigenId": 2, "tareaDestinoId": 3, "tipo": "start_to_start" },
            { "id": 3, "proyectoId": 1, "tareaOrigenId": 3, "tareaDestinoId": 4, "tipo": "finish_to_start" },
            { "id": 4, "proyectoId": 1, "tareaOrigenId": 4, "tareaDestinoId": 5, "tipo": "finish_to_finish" },
            { "id": 5, "proyectoId": 1, "tareaOrigenId": 6, "tareaDestinoId": 5, "tipo": "start_to_finish" }
        ]);
        let baseline = json!([
            { "nombre": "Design", "fechaInicioPlanificada": day(-20), "fechaFinPlanificada": day(0),
              "edts": [
                { "nombre": "Drawings", "fechaInicioPlanificada": day(-20), "fechaFinPlanificada": day(-4),
                  "tareas": [
                    { "nombre": "Site survey", "fechaInicio": day(-20), "fechaFin": day(-14) },
                    { "nombre": "Floor plans", "fechaInicio": day(-14), "fechaFin": day(-4) }
                  ] },
                { "nombre": "Permits", "fechaInicioPlanificada": day(-8), "fechaFinPlanificada": day(0),
                  "tareas": [{ "nombre": "Building permit", "fechaInicio": day(-8), "fechaFin": day(0) }] }
              ] },
            { "nombre": "Construction", "fechaInicioPlanificada": day(0), "fechaFinPlanificada": day(55),
              "edts": [
                { "nombre": "Structure", "fechaInicioPlanificada": day(0), "fechaFinPlanificada": day(35),
                  "tareas": [
                    { "nombre": "Foundations", "fechaInicio": day(0), "fechaFin": day(12) },
                    { "nombre": "Frame", "fechaInicio": day(12), "fechaFin": day(35) }
                  ] }
              ] }
        ]);

        Self::new()
            .with_collection(Collection::Phases, phases)
            .with_collection(Collection::WorkPackages, work_packages)
            .with_collection(Collection::Tasks, tasks)
            .with_collection(Collection::Subtasks, subtasks)
            .with_collection(Collection::Dependencies, dependencies)
            .with_schedule(json!({ "id": 1, "nombre": "Plan (frozen)", "tipo": "planificacion" }))
            .with_schedule(json!({ "id": 2, "nombre": "Execution", "tipo": "ejecucion", "lineaBaseId": 1 }))
            .with_tree(1, json!({ "data": baseline }))
    }
}

impl ScheduleStore for MemoryStore {
    fn fetch(&self, collection: Collection, scope: &Scope) -> StoreResult<Value> {
        if self.failing_reads.contains(&collection) {
            return Err(StoreError::Status {
                status: 503,
                message: format!("{} unavailable", collection.path()),
            });
        }
        Ok(match self.collections.get(&collection) {
            Some(Value::Array(records)) => Value::Array(
                records
                    .iter()
                    .filter(|r| in_scope(r, collection, scope))
                    .cloned()
                    .collect(),
            ),
            Some(other) => other.clone(),
            None => Value::Array(Vec::new()),
        })
    }

    fn patch_dates(&mut self, item: ItemKey, fields: DateFields, dates: DateSpan) -> StoreResult<()> {
        if self.failing_patches {
            return Err(StoreError::Status {
                status: 500,
                message: "write rejected".into(),
            });
        }
        let collection = Collection::for_level(item.level);
        let found = match self.collections.get_mut(&collection) {
            Some(Value::Array(records)) => apply_patch(records, item, fields, dates),
            _ => false,
        };
        if !found {
            return Err(StoreError::NotFound(item.to_string()));
        }
        self.patches.push((item, dates));
        Ok(())
    }

    fn fetch_schedule(&self, schedule_id: i64) -> StoreResult<Option<ScheduleInfo>> {
        Ok(self
            .schedules
            .iter()
            .filter_map(wire::schedule_from_record)
            .find(|s| s.id == schedule_id))
    }

    fn fetch_baseline_tree(&self, schedule_id: i64) -> StoreResult<Value> {
        self.trees
            .get(&schedule_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("schedule tree {schedule_id}")))
    }

    fn describe(&self) -> String {
        "demo data (in memory)".to_string()
    }
}
