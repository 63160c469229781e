//! The Gantt orchestrator: owns the schedule collections and session state,
//! and routes committed edits through the store.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::bar::{self, BarGeometry};
use super::dependency::{self, Connector};
use super::drag::DragOutcome;
use super::geometry::Point;
use super::layout::{compute_rows, ExpandedSet, Row, RowIndex};
use crate::error::EngineError;
use crate::model::{
    BaselineMap, DateFields, DateSpan, Dependency, HistoryAction, HistoryKind, HistoryStack, ItemKey, Level,
    ReplayStep, ScheduleInfo, ScheduleItem, ScheduleItems, TimelineModel, TimelineScale,
};
use crate::store::{coerce_records, wire, Collection, ScheduleStore, Scope};

/// What a load or reload brought in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub phases: usize,
    pub work_packages: usize,
    pub tasks: usize,
    pub subtasks: usize,
    pub dependencies: usize,
    /// Records dropped for having no id, or dependency rows that could not
    /// be normalised.
    pub skipped_records: usize,
    pub baseline_entries: usize,
}

impl std::fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} phases, {} work packages, {} tasks, {} subtasks, {} dependencies",
            self.phases, self.work_packages, self.tasks, self.subtasks, self.dependencies
        )?;
        if self.skipped_records > 0 {
            write!(f, " ({} records skipped)", self.skipped_records)?;
        }
        Ok(())
    }
}

pub struct GanttEngine<S> {
    store: S,
    scope: Option<Scope>,
    schedule: Option<ScheduleInfo>,
    items: ScheduleItems,
    dependencies: Vec<Dependency>,
    expanded: ExpandedSet,
    baseline: BaselineMap,
    history: HistoryStack,
    timeline: TimelineModel,
    rows: RowIndex,
    today: NaiveDate,
}

impl<S: ScheduleStore> GanttEngine<S> {
    pub fn new(store: S, today: NaiveDate) -> Self {
        Self {
            store,
            scope: None,
            schedule: None,
            items: ScheduleItems::default(),
            dependencies: Vec::new(),
            expanded: ExpandedSet::new(),
            baseline: BaselineMap::new(),
            history: HistoryStack::new(),
            timeline: TimelineModel::fit(&[], TimelineScale::Weeks, 1.0, today),
            rows: RowIndex::default(),
            today,
        }
    }

    /// Start with a given scale and zoom instead of weeks at 100%.
    pub fn with_view(mut self, scale: TimelineScale, zoom: f32) -> Self {
        self.timeline = TimelineModel::fit(&self.items.all_dates(), scale, zoom, self.today);
        self
    }

    // ── Loading ─────────────────────────────────────────────────

    /// Open a schedule. Session state (history, expansion) starts fresh.
    pub fn load(&mut self, scope: Scope) -> LoadSummary {
        info!(project = scope.project_id, schedule = ?scope.schedule_id, store = %self.store.describe(), "loading schedule");
        self.scope = Some(scope);
        self.history.clear();
        self.expanded = ExpandedSet::new();
        self.schedule = scope.schedule_id.and_then(|id| match self.store.fetch_schedule(id) {
            Ok(info) => info,
            Err(e) => {
                warn!(schedule = id, error = %e, "schedule header unavailable");
                None
            }
        });
        self.baseline = self.fetch_baseline();
        self.refresh()
    }

    /// Re-read the collections of the current schedule, keeping history and
    /// expansion.
    pub fn reload(&mut self) -> Result<LoadSummary, EngineError> {
        if self.scope.is_none() {
            return Err(EngineError::NoSchedule);
        }
        Ok(self.refresh())
    }

    fn refresh(&mut self) -> LoadSummary {
        let Some(scope) = self.scope else {
            return LoadSummary::default();
        };
        let mut skipped = 0;
        let mut items = ScheduleItems::default();
        for level in Level::ALL {
            let records = self.fetch_records(Collection::for_level(level), &scope);
            let total = records.len();
            let parsed: Vec<ScheduleItem> = records
                .iter()
                .filter_map(|r| wire::item_from_record(level, r))
                .collect();
            skipped += total - parsed.len();
            *items.collection_mut(level) = parsed;
        }

        let records = self.fetch_records(Collection::Dependencies, &scope);
        let total = records.len();
        self.dependencies = records
            .iter()
            .filter_map(wire::dependency_from_record)
            .collect();
        skipped += total - self.dependencies.len();

        self.items = items;
        self.timeline.refit(&self.items.all_dates(), self.today);
        self.relayout();

        let summary = LoadSummary {
            phases: self.items.phases.len(),
            work_packages: self.items.work_packages.len(),
            tasks: self.items.tasks.len(),
            subtasks: self.items.subtasks.len(),
            dependencies: self.dependencies.len(),
            skipped_records: skipped,
            baseline_entries: self.baseline.len(),
        };
        debug!(%summary, "schedule refreshed");
        summary
    }

    /// Read one collection. Failures and odd shapes degrade to empty.
    fn fetch_records(&self, collection: Collection, scope: &Scope) -> Vec<Value> {
        match self.store.fetch(collection, scope) {
            Ok(value) => coerce_records(value, collection.path()),
            Err(e) => {
                warn!(collection = collection.path(), error = %e, "read failed, showing nothing");
                Vec::new()
            }
        }
    }

    fn fetch_baseline(&self) -> BaselineMap {
        let Some(baseline_id) = self.schedule.as_ref().and_then(ScheduleInfo::overlay_source) else {
            return BaselineMap::new();
        };
        match self.store.fetch_baseline_tree(baseline_id) {
            Ok(tree) => {
                let map = wire::flatten_baseline(&tree);
                info!(baseline = baseline_id, entries = map.len(), "baseline loaded");
                map
            }
            Err(e) => {
                debug!(baseline = baseline_id, error = %e, "no baseline overlay");
                BaselineMap::new()
            }
        }
    }

    fn relayout(&mut self) {
        self.rows = RowIndex::new(compute_rows(&self.items, &self.expanded));
    }

    // ── Expand / collapse and view ──────────────────────────────

    pub fn toggle_expand(&mut self, key: ItemKey) {
        self.expanded = self.expanded.toggled(key);
        self.relayout();
    }

    pub fn expand_all(&mut self) {
        let parents: Vec<ItemKey> = self
            .items
            .iter()
            .filter(|i| self.has_children(i.key))
            .map(|i| i.key)
            .collect();
        self.expanded = self.expanded.with_all(parents);
        self.relayout();
    }

    pub fn collapse_all(&mut self) {
        self.expanded = ExpandedSet::new();
        self.relayout();
    }

    pub fn set_scale(&mut self, scale: TimelineScale) {
        self.timeline.set_scale(scale);
    }

    pub fn zoom_in(&mut self) {
        self.timeline.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.timeline.zoom_out();
    }

    // ── Commits ─────────────────────────────────────────────────

    /// Persist a moved bar.
    pub fn on_drag_commit(&mut self, item: ItemKey, new_start: NaiveDate, new_end: NaiveDate) -> Result<(), EngineError> {
        self.commit_dates(item, DateSpan::new(new_start, new_end), HistoryKind::Move)
    }

    /// Persist a resized bar.
    pub fn on_resize_commit(&mut self, item: ItemKey, new_start: NaiveDate, new_end: NaiveDate) -> Result<(), EngineError> {
        self.commit_dates(item, DateSpan::new(new_start, new_end), HistoryKind::Resize)
    }

    /// Persist the result of a finished pointer drag.
    pub fn commit(&mut self, outcome: DragOutcome) -> Result<(), EngineError> {
        if outcome.is_resize() {
            self.on_resize_commit(outcome.item, outcome.new.start, outcome.new.end)
        } else {
            self.on_drag_commit(outcome.item, outcome.new.start, outcome.new.end)
        }
    }

    fn commit_dates(&mut self, item: ItemKey, new: DateSpan, kind: HistoryKind) -> Result<(), EngineError> {
        let fields = self
            .items
            .get(item)
            .map_or(DateFields::Planned, ScheduleItem::displayed_fields);
        let previous = self.items.get(item).and_then(|i| i.span_of(fields));
        if previous == Some(new) {
            return Ok(());
        }

        self.store.patch_dates(item, fields, new).map_err(|source| {
            warn!(%item, error = %source, "saving dates failed");
            EngineError::Persistence { item, source }
        })?;
        info!(%item, start = %new.start, end = %new.end, ?kind, ?fields, "dates saved");

        if let Some(previous) = previous {
            self.history.record(HistoryAction {
                kind,
                item,
                fields,
                previous,
                new,
            });
        }
        self.refresh();
        Ok(())
    }

    /// Revert the last committed edit. `Ok(None)` when there is nothing to
    /// undo. A failed write leaves the history as it was.
    pub fn undo(&mut self) -> Result<Option<ReplayStep>, EngineError> {
        let Some(step) = self.history.undo() else {
            return Ok(None);
        };
        if let Err(source) = self.store.patch_dates(step.item, step.fields, step.dates) {
            self.history.redo();
            warn!(item = %step.item, error = %source, "undo failed");
            return Err(EngineError::Persistence { item: step.item, source });
        }
        info!(item = %step.item, "undo");
        self.refresh();
        Ok(Some(step))
    }

    /// Re-apply the last undone edit.
    pub fn redo(&mut self) -> Result<Option<ReplayStep>, EngineError> {
        let Some(step) = self.history.redo() else {
            return Ok(None);
        };
        if let Err(source) = self.store.patch_dates(step.item, step.fields, step.dates) {
            self.history.undo();
            warn!(item = %step.item, error = %source, "redo failed");
            return Err(EngineError::Persistence { item: step.item, source });
        }
        info!(item = %step.item, "redo");
        self.refresh();
        Ok(Some(step))
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn rows(&self) -> &[Row] {
        self.rows.rows()
    }

    pub fn row(&self, key: ItemKey) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn row_at(&self, y: f32) -> Option<&Row> {
        self.rows.row_at(y)
    }

    pub fn total_height(&self) -> f32 {
        self.rows.total_height()
    }

    pub fn item(&self, key: ItemKey) -> Option<&ScheduleItem> {
        self.items.get(key)
    }

    pub fn items(&self) -> &ScheduleItems {
        &self.items
    }

    /// Visible rows paired with their items, top to bottom.
    pub fn visible_items(&self) -> impl Iterator<Item = (&Row, &ScheduleItem)> + '_ {
        self.rows
            .rows()
            .iter()
            .filter_map(|row| self.items.get(row.key).map(|item| (row, item)))
    }

    pub fn has_children(&self, key: ItemKey) -> bool {
        self.items.children_of(key).next().is_some()
    }

    pub fn is_expanded(&self, key: ItemKey) -> bool {
        self.expanded.contains(key)
    }

    pub fn expanded(&self) -> &ExpandedSet {
        &self.expanded
    }

    /// Bar placement of a visible item with usable dates.
    pub fn bar(&self, key: ItemKey) -> Option<BarGeometry> {
        let row = self.rows.get(key)?;
        let item = self.items.get(key)?;
        bar::bar_geometry(item, row, &self.timeline, self.today)
    }

    /// Bar placement with candidate dates, for drawing a drag in progress.
    pub fn bar_with_span(&self, key: ItemKey, span: DateSpan) -> Option<BarGeometry> {
        let row = self.rows.get(key)?;
        let item = self.items.get(key)?;
        Some(bar::bar_geometry_for_span(item, span, row, &self.timeline, self.today))
    }

    /// Connectors for dependencies whose endpoints are both visible.
    pub fn connectors(&self) -> Vec<Connector> {
        self.connectors_with(|_| None)
    }

    /// Connectors attached to candidate dates where `preview` has some, so
    /// arrows follow a bar while it is being dragged.
    pub fn connectors_with<F>(&self, preview: F) -> Vec<Connector>
    where
        F: Fn(ItemKey) -> Option<DateSpan>,
    {
        dependency::render(&self.dependencies, |key| match preview(key) {
            Some(span) => self.bar_with_span(key, span),
            None => self.bar(key),
        })
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn baseline(&self) -> &BaselineMap {
        &self.baseline
    }

    pub fn baseline_span(&self, key: ItemKey) -> Option<DateSpan> {
        self.baseline.for_item(self.items.get(key)?)
    }

    /// Corners of the faint baseline bar for a visible item.
    pub fn baseline_bar(&self, key: ItemKey) -> Option<(Point, Point)> {
        let span = self.baseline_span(key)?;
        let row = self.rows.get(key)?;
        Some(bar::baseline_geometry(span, row, &self.timeline))
    }

    pub fn variance_days(&self, key: ItemKey) -> Option<i64> {
        self.baseline.variance_days(self.items.get(key)?)
    }

    pub fn timeline(&self) -> &TimelineModel {
        &self.timeline
    }

    pub fn schedule(&self) -> Option<&ScheduleInfo> {
        self.schedule.as_ref()
    }

    pub fn scope(&self) -> Option<Scope> {
        self.scope
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::drag::{DragHandle, TaskBarDrag};
    use crate::model::DependencyKind;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn span(m: u32, start: u32, end: u32) -> DateSpan {
        DateSpan::new(d(m, start), d(m, end))
    }

    /// Phase 1 › work package 1 › tasks 1 (Jan 1–5) and 2 (Jan 8–10),
    /// task 1 › subtask 1; phase 2 runs Feb 1–5.
    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_collection(
                Collection::Phases,
                json!([
                    { "id": 1, "nombre": "Design", "fechaInicioPlanificada": "2024-01-01", "fechaFinPlanificada": "2024-01-10" },
                    { "id": 2, "nombre": "Build", "fechaInicioPlanificada": "2024-02-01", "fechaFinPlanificada": "2024-02-05" }
                ]),
            )
            .with_collection(
                Collection::WorkPackages,
                json!([{ "id": 1, "faseId": 1, "nombre": "Drawings", "fechaInicioPlanificada": "2024-01-01", "fechaFinPlanificada": "2024-01-10" }]),
            )
            .with_collection(
                Collection::Tasks,
                json!([
                    { "id": 1, "edtId": 1, "nombre": "Survey", "fechaInicio": "2024-01-01", "fechaFin": "2024-01-05", "porcentajeAvance": 50 },
                    { "id": 2, "edtId": 1, "nombre": "Plans", "fechaInicio": "2024-01-08", "fechaFin": "2024-01-10" }
                ]),
            )
            .with_collection(
                Collection::Subtasks,
                json!([{ "id": 1, "tareaId": 1, "nombre": "Measure", "fechaInicio": "2024-01-02", "fechaFin": "2024-01-03" }]),
            )
            .with_collection(
                Collection::Dependencies,
                json!({ "data": [{ "id": 7, "fromTaskId": 1, "toTaskId": 2, "type": "finish_to_start" }] }),
            )
            .with_schedule(json!({ "id": 1, "nombre": "Plan", "tipo": "planificacion" }))
            .with_schedule(json!({ "id": 2, "nombre": "Execution", "tipo": "ejecucion", "lineaBaseId": 1 }))
            .with_tree(1, json!([{ "nombre": "Survey", "fechaInicio": "2024-01-01", "fechaFin": "2024-01-03" }]))
    }

    fn engine() -> GanttEngine<MemoryStore> {
        let mut engine = GanttEngine::new(store(), d(1, 20));
        engine.load(Scope::new(1, Some(2)));
        engine
    }

    fn expand_to_tasks(engine: &mut GanttEngine<MemoryStore>) {
        engine.toggle_expand(ItemKey::phase(1));
        engine.toggle_expand(ItemKey::work_package(1));
    }

    #[test]
    fn load_reads_every_collection_and_fits_the_timeline() {
        let mut engine = GanttEngine::new(store(), d(1, 20));
        let summary = engine.load(Scope::new(1, Some(2)));
        assert_eq!(
            summary,
            LoadSummary {
                phases: 2,
                work_packages: 1,
                tasks: 2,
                subtasks: 1,
                dependencies: 1,
                skipped_records: 0,
                baseline_entries: 1,
            }
        );
        assert_eq!(engine.timeline().start, NaiveDate::from_ymd_opt(2023, 12, 25).unwrap());
        assert_eq!(engine.timeline().end, d(2, 12));
        assert_eq!(engine.rows().len(), 2);
        assert_eq!(engine.dependencies()[0].kind, DependencyKind::FinishToStart);
        assert_eq!(engine.dependencies()[0].from, ItemKey::task(1));
    }

    #[test]
    fn baseline_is_only_overlaid_for_execution_schedules() {
        let engine = engine();
        assert_eq!(engine.baseline_span(ItemKey::task(1)), Some(span(1, 1, 3)));
        assert_eq!(engine.variance_days(ItemKey::task(1)), Some(2));

        let mut planning = GanttEngine::new(store(), d(1, 20));
        planning.load(Scope::new(1, Some(1)));
        assert!(planning.baseline().is_empty());
    }

    #[test]
    fn unreadable_collections_degrade_to_an_empty_chart() {
        let mut broken = store()
            .with_collection(Collection::Phases, json!({ "error": "boom" }))
            .with_collection(Collection::Tasks, json!([{ "nombre": "no id" }, { "id": 2, "edtId": 1 }]));
        broken.set_failing_read(Collection::Dependencies);
        let mut engine = GanttEngine::new(broken, d(1, 20));
        let summary = engine.load(Scope::new(1, Some(2)));
        assert_eq!(summary.phases, 0);
        assert_eq!(summary.tasks, 1);
        assert_eq!(summary.skipped_records, 1);
        assert_eq!(summary.dependencies, 0);
        assert!(engine.rows().is_empty());
        assert!(engine.connectors().is_empty());
    }

    #[test]
    fn missing_baseline_tree_is_not_an_error() {
        let mut engine = GanttEngine::new(store().with_schedule(json!({ "id": 3, "tipo": "ejecucion", "lineaBaseId": 99 })), d(1, 20));
        let summary = engine.load(Scope::new(1, Some(3)));
        assert_eq!(summary.baseline_entries, 0);
        assert_eq!(summary.phases, 2);
    }

    #[test]
    fn finish_to_start_connector_runs_from_finish_to_start() {
        let mut engine = engine();
        expand_to_tasks(&mut engine);
        let connectors = engine.connectors();
        assert_eq!(connectors.len(), 1);
        let tl = engine.timeline();
        assert!((connectors[0].from.x - tl.date_to_x(d(1, 5))).abs() < 1e-3);
        assert!((connectors[0].to.x - tl.date_to_x(d(1, 8))).abs() < 1e-3);
        assert_eq!(connectors[0].from.y, engine.row(ItemKey::task(1)).unwrap().mid_y());
    }

    #[test]
    fn connectors_follow_a_bar_being_dragged() {
        let mut engine = engine();
        expand_to_tasks(&mut engine);
        let mut drag = TaskBarDrag::new();
        drag.on_down(ItemKey::task(1), DragHandle::Move, 0.0, span(1, 1, 5), 10.0);
        drag.on_move(30.0);

        let tl = engine.timeline();
        let moving = engine.connectors_with(|key| drag.preview(key));
        assert!((moving[0].from.x - tl.date_to_x(d(1, 8))).abs() < 1e-3);
        assert!((moving[0].to.x - tl.date_to_x(d(1, 8))).abs() < 1e-3);
        let settled = engine.connectors();
        assert!((settled[0].from.x - tl.date_to_x(d(1, 5))).abs() < 1e-3);
    }

    #[test]
    fn collapsing_hides_rows_and_connectors() {
        let mut engine = engine();
        let collapsed_height = engine.total_height();
        expand_to_tasks(&mut engine);
        engine.toggle_expand(ItemKey::task(1));
        assert_eq!(engine.rows().len(), 6);
        assert!(engine.total_height() > collapsed_height);

        engine.toggle_expand(ItemKey::phase(1));
        assert_eq!(engine.total_height(), collapsed_height);
        assert!(engine.connectors().is_empty());
        assert!(engine.bar(ItemKey::task(1)).is_none());
    }

    #[test]
    fn drag_commit_patches_once_records_history_and_reloads() {
        let mut engine = engine();
        expand_to_tasks(&mut engine);

        let mut drag = TaskBarDrag::new();
        drag.on_down(ItemKey::task(2), DragHandle::Move, 100.0, span(1, 8, 10), 20.0 / 7.0);
        drag.on_move(103.0);
        let outcome = drag.on_up().unwrap();
        engine.commit(outcome).unwrap();

        assert_eq!(engine.store().patches(), &[(ItemKey::task(2), span(1, 9, 11))]);
        assert_eq!(engine.item(ItemKey::task(2)).unwrap().display_span(), Some(span(1, 9, 11)));
        assert_eq!(engine.history().last().map(|a| a.kind), Some(HistoryKind::Move));
        // Expansion survives the post-commit reload.
        assert!(engine.bar(ItemKey::task(2)).is_some());
    }

    #[test]
    fn failed_commit_records_nothing_and_keeps_the_old_dates() {
        let mut engine = engine();
        engine.store_mut().set_failing_patches(true);
        let err = engine.on_resize_commit(ItemKey::task(1), d(1, 1), d(1, 9)).unwrap_err();
        assert!(matches!(err, EngineError::Persistence { item, .. } if item == ItemKey::task(1)));
        assert!(!engine.can_undo());
        assert_eq!(engine.item(ItemKey::task(1)).unwrap().display_span(), Some(span(1, 1, 5)));
    }

    #[test]
    fn unchanged_dates_are_not_written() {
        let mut engine = engine();
        engine.on_drag_commit(ItemKey::task(1), d(1, 1), d(1, 5)).unwrap();
        assert!(engine.store().patches().is_empty());
        assert!(!engine.can_undo());
    }

    #[test]
    fn undo_and_redo_replay_through_the_store() {
        let mut engine = engine();
        engine.on_drag_commit(ItemKey::task(1), d(1, 3), d(1, 7)).unwrap();
        engine.on_resize_commit(ItemKey::task(1), d(1, 3), d(1, 9)).unwrap();

        let step = engine.undo().unwrap().unwrap();
        assert_eq!(step.dates, span(1, 3, 7));
        let step = engine.undo().unwrap().unwrap();
        assert_eq!(step.dates, span(1, 1, 5));
        assert_eq!(engine.item(ItemKey::task(1)).unwrap().display_span(), Some(span(1, 1, 5)));
        assert_eq!(engine.undo().unwrap(), None);

        assert_eq!(engine.redo().unwrap().unwrap().dates, span(1, 3, 7));
        assert_eq!(engine.item(ItemKey::task(1)).unwrap().display_span(), Some(span(1, 3, 7)));
        assert_eq!(engine.store().patches().len(), 5);
    }

    #[test]
    fn edits_on_started_work_move_the_actual_dates_and_undo_restores_them() {
        let started = store().with_collection(
            Collection::Tasks,
            json!([{
                "id": 3, "edtId": 1, "nombre": "Excavation",
                "fechaInicio": "2024-01-01", "fechaFin": "2024-01-05",
                "fechaInicioReal": "2024-01-03", "fechaFinReal": "2024-01-09"
            }]),
        );
        let mut engine = GanttEngine::new(started, d(1, 20));
        engine.load(Scope::new(1, Some(2)));
        expand_to_tasks(&mut engine);
        let key = ItemKey::task(3);
        let shown = engine.item(key).unwrap().display_span().unwrap();
        assert_eq!(shown, span(1, 3, 9));

        let mut drag = TaskBarDrag::new();
        drag.on_down(key, DragHandle::Move, 100.0, shown, 10.0);
        drag.on_move(130.0);
        engine.commit(drag.on_up().unwrap()).unwrap();

        let item = engine.item(key).unwrap();
        assert_eq!(item.display_span(), Some(span(1, 6, 12)));
        assert_eq!(item.span_of(DateFields::Planned), Some(span(1, 1, 5)));
        assert_eq!(engine.history().last().map(|a| (a.fields, a.previous)), Some((DateFields::Actual, span(1, 3, 9))));

        let step = engine.undo().unwrap().unwrap();
        assert_eq!(step.fields, DateFields::Actual);
        let item = engine.item(key).unwrap();
        assert_eq!(item.display_span(), Some(span(1, 3, 9)));
        assert_eq!(item.span_of(DateFields::Planned), Some(span(1, 1, 5)));
    }

    #[test]
    fn new_commit_after_undo_drops_redo() {
        let mut engine = engine();
        engine.on_drag_commit(ItemKey::task(1), d(1, 3), d(1, 7)).unwrap();
        engine.undo().unwrap();
        engine.on_drag_commit(ItemKey::task(2), d(1, 9), d(1, 11)).unwrap();
        assert_eq!(engine.redo().unwrap(), None);
    }

    #[test]
    fn failed_undo_stays_undoable() {
        let mut engine = engine();
        engine.on_drag_commit(ItemKey::subtask(1), d(1, 4), d(1, 5)).unwrap();
        engine.store_mut().set_failing_patches(true);
        assert!(engine.undo().is_err());
        assert!(engine.can_undo());
        assert!(!engine.can_redo());

        engine.store_mut().set_failing_patches(false);
        assert_eq!(engine.undo().unwrap().unwrap().dates, span(1, 2, 3));
        engine.store_mut().set_failing_patches(true);
        assert!(engine.redo().is_err());
        assert!(engine.can_redo());
    }

    #[test]
    fn fresh_load_clears_session_state_but_reload_keeps_it() {
        let mut engine = engine();
        expand_to_tasks(&mut engine);
        engine.on_drag_commit(ItemKey::task(1), d(1, 3), d(1, 7)).unwrap();

        engine.reload().unwrap();
        assert!(engine.can_undo());
        assert!(engine.is_expanded(ItemKey::phase(1)));

        engine.load(Scope::new(1, Some(2)));
        assert!(!engine.can_undo());
        assert!(engine.expanded().is_empty());
    }

    #[test]
    fn reload_without_a_schedule_is_an_error() {
        let mut engine = GanttEngine::new(MemoryStore::new(), d(1, 1));
        assert!(matches!(engine.reload(), Err(EngineError::NoSchedule)));
        assert!(engine.rows().is_empty());
    }

    #[test]
    fn resize_commits_keep_a_day_minimum() {
        let mut engine = engine();
        expand_to_tasks(&mut engine);
        for (key, handle, dx) in [
            (ItemKey::task(2), DragHandle::Start, 5000.0),
            (ItemKey::task(1), DragHandle::End, -5000.0),
        ] {
            let original = engine.item(key).unwrap().display_span().unwrap();
            let mut drag = TaskBarDrag::new();
            drag.on_down(key, handle, 0.0, original, engine.timeline().pixels_per_day());
            drag.on_move(dx);
            engine.commit(drag.on_up().unwrap()).unwrap();
            let now = engine.item(key).unwrap().display_span().unwrap();
            assert_eq!(now.days(), 1);
        }
    }

    #[test]
    fn expand_all_opens_every_parent() {
        let mut engine = engine();
        engine.expand_all();
        assert_eq!(engine.rows().len(), 6);
        engine.collapse_all();
        assert_eq!(engine.rows().len(), 2);
    }

    #[test]
    fn zoom_and_scale_never_touch_dates() {
        let mut engine = engine();
        let before = engine.items().all_dates();
        engine.zoom_in();
        engine.set_scale(TimelineScale::Months);
        assert_eq!(engine.items().all_dates(), before);
        assert!(engine.store().patches().is_empty());
    }
}
