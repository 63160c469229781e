use chrono::NaiveDate;
use tracing::{error, info};

use crate::config::{AppSettings, Backend};
use crate::engine::{DragOutcome, GanttEngine, TaskBarDrag};
use crate::error::EngineError;
use crate::model::{ItemKey, TimelineScale};
use crate::store::{FileStore, MemoryStore, RestStore, ScheduleStore};
use crate::ui;
use crate::ui::dialogs::DateDialog;
use crate::ui::gantt_chart::{ChartOptions, ZoomRequest};
use crate::ui::task_table::TaskTableAction;

const ENV_API_TOKEN: &str = "GANTT_API_TOKEN";

/// Main application state.
pub struct GanttApp {
    pub settings: AppSettings,
    pub engine: GanttEngine<Box<dyn ScheduleStore>>,
    pub drag: TaskBarDrag,
    pub selected: Option<ItemKey>,
    /// Chart scroll offset from the last frame, mirrored by the table.
    pub scroll_y: f32,

    // Dialog state
    pub date_dialog: Option<DateDialog>,
    pub error: Option<String>,
    pub show_about: bool,

    pub status_message: String,
}

impl GanttApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        ui::theme::install_fonts(&cc.egui_ctx);
        ui::theme::apply_theme(&cc.egui_ctx);

        let settings = AppSettings::load();
        let today = chrono::Local::now().date_naive();
        let (store, status) = match make_store(&settings, today) {
            Ok(store) => (store, None),
            Err(e) => {
                error!(error = %e, "falling back to demo data");
                (demo_store(today), Some(format!("{e}; showing demo data")))
            }
        };

        let mut app = Self {
            engine: GanttEngine::new(store, today).with_view(settings.scale, settings.zoom),
            settings,
            drag: TaskBarDrag::new(),
            selected: None,
            scroll_y: 0.0,
            date_dialog: None,
            error: None,
            show_about: false,
            status_message: "Ready".to_string(),
        };
        app.load();
        if let Some(status) = status {
            app.status_message = status;
        }
        app
    }

    // --- Data source ---

    /// Open the configured schedule from scratch.
    pub fn load(&mut self) {
        let summary = self.engine.load(self.settings.scope());
        self.selected = None;
        self.drag.on_cancel();
        self.status_message = format!("Loaded {summary}");
    }

    pub fn reload(&mut self) {
        match self.engine.reload() {
            Ok(summary) => self.status_message = format!("Reloaded {summary}"),
            Err(e) => self.status_message = e.to_string(),
        }
    }

    pub fn switch_backend(&mut self, backend: Backend) {
        let previous = self.settings.backend;
        self.settings.backend = backend;
        let today = chrono::Local::now().date_naive();
        match make_store(&self.settings, today) {
            Ok(store) => {
                info!(backend = backend.label(), "switching data source");
                self.engine = GanttEngine::new(store, today).with_view(self.settings.scale, self.settings.zoom);
                self.persist_settings();
                self.load();
            }
            Err(e) => {
                self.settings.backend = previous;
                self.status_message = e;
            }
        }
    }

    pub fn open_data_folder(&mut self) {
        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
            self.settings.data_dir = Some(dir);
            self.switch_backend(Backend::Files);
        }
    }

    pub fn reveal_data_folder(&mut self) {
        if let Some(dir) = &self.settings.data_dir {
            if let Err(e) = open::that(dir) {
                self.status_message = format!("Could not open {}: {}", dir.display(), e);
            }
        }
    }

    pub fn export_csv(&mut self) {
        if self.engine.rows().is_empty() {
            self.status_message = "Nothing to export".to_string();
            return;
        }

        let default_name = self
            .engine
            .schedule()
            .map(|s| format!("{}.csv", s.name))
            .unwrap_or_else(|| "schedule.csv".to_string());
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(&default_name)
            .save_file()
        {
            match crate::io::csv_export::export_rows(&self.engine, &path) {
                Ok(count) => self.status_message = format!("Exported {} rows to CSV", count),
                Err(e) => self.status_message = format!("CSV export failed: {}", e),
            }
        }
    }

    pub fn persist_settings(&mut self) {
        if let Err(e) = self.settings.save() {
            self.status_message = e;
        }
    }

    // --- View ---

    pub fn zoom_in(&mut self) {
        self.engine.zoom_in();
        self.settings.zoom = self.engine.timeline().zoom;
    }

    pub fn zoom_out(&mut self) {
        self.engine.zoom_out();
        self.settings.zoom = self.engine.timeline().zoom;
    }

    pub fn set_scale(&mut self, scale: TimelineScale) {
        self.engine.set_scale(scale);
        self.settings.scale = scale;
        self.persist_settings();
    }

    // --- Edits ---

    fn commit(&mut self, outcome: DragOutcome) {
        let result = self.engine.commit(outcome);
        self.report_commit(outcome.item, result);
    }

    fn report_commit(&mut self, item: ItemKey, result: Result<(), EngineError>) {
        match result {
            Ok(()) => {
                self.status_message = match self.engine.item(item).and_then(|i| i.display_span().map(|s| (i, s))) {
                    Some((i, span)) => format!(
                        "Updated '{}' ({} → {})",
                        i.name,
                        span.start.format("%Y-%m-%d"),
                        span.end.format("%Y-%m-%d")
                    ),
                    None => "Timeline updated".to_string(),
                };
            }
            Err(e) => self.show_error(e),
        }
    }

    fn show_error(&mut self, e: EngineError) {
        self.status_message = e.to_string();
        self.error = Some(e.to_string());
    }

    pub fn undo(&mut self) {
        match self.engine.undo() {
            Ok(Some(step)) => self.status_message = format!("Undo: {} back to {}", step.item, step.dates.start),
            Ok(None) => {}
            Err(e) => self.show_error(e),
        }
    }

    pub fn redo(&mut self) {
        match self.engine.redo() {
            Ok(Some(step)) => self.status_message = format!("Redo: {} to {}", step.item, step.dates.start),
            Ok(None) => {}
            Err(e) => self.show_error(e),
        }
    }

    pub fn open_date_dialog(&mut self, key: ItemKey) {
        let Some(item) = self.engine.item(key) else {
            return;
        };
        let today = self.engine.today();
        let (start, end) = match item.display_span() {
            Some(span) => (span.start, span.end),
            None => (today, today + chrono::Duration::days(1)),
        };
        self.date_dialog = Some(DateDialog::new(key, item.name.clone(), start, end));
    }

    pub fn save_date_dialog(&mut self) {
        let Some(dialog) = self.date_dialog.take() else {
            return;
        };
        let result = if dialog.is_move() {
            self.engine.on_drag_commit(dialog.key, dialog.start, dialog.end)
        } else {
            self.engine.on_resize_commit(dialog.key, dialog.start, dialog.end)
        };
        self.report_commit(dialog.key, result);
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let (undo, redo, reload, escape) = ctx.input(|i| {
            let ctrl = i.modifiers.command;
            (
                ctrl && !i.modifiers.shift && i.key_pressed(egui::Key::Z),
                ctrl && (i.key_pressed(egui::Key::Y) || (i.modifiers.shift && i.key_pressed(egui::Key::Z))),
                ctrl && i.key_pressed(egui::Key::R),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if escape && self.drag.is_dragging() {
            self.drag.on_cancel();
            self.status_message = "Drag cancelled".to_string();
        }
        // Dialogs own the keyboard while open.
        if self.date_dialog.is_some() || self.error.is_some() {
            return;
        }
        if undo {
            self.undo();
        }
        if redo {
            self.redo();
        }
        if reload {
            self.reload();
        }
    }
}

fn demo_store(today: NaiveDate) -> Box<dyn ScheduleStore> {
    Box::new(MemoryStore::sample(today))
}

fn make_store(settings: &AppSettings, today: NaiveDate) -> Result<Box<dyn ScheduleStore>, String> {
    match settings.backend {
        Backend::Demo => Ok(demo_store(today)),
        Backend::Files => settings
            .data_dir
            .as_ref()
            .map(|dir| Box::new(FileStore::new(dir)) as Box<dyn ScheduleStore>)
            .ok_or_else(|| "No data folder selected".to_string()),
        Backend::Rest => {
            let store = RestStore::new(&settings.api_base_url)
                .map_err(|e| format!("Could not create API client: {e}"))?
                .with_token(std::env::var(ENV_API_TOKEN).ok());
            Ok(Box::new(store))
        }
    }
}

impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .size(11.0)
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let dim = |text: String| egui::RichText::new(text).size(10.5).color(ui::theme::TEXT_DIM);
                        ui.label(dim(format!("Zoom: {:.0}%", self.engine.timeline().zoom * 100.0)));
                        ui.label(dim(" · ".into()));
                        ui.label(dim(format!(
                            "Undo: {} · Redo: {}",
                            self.engine.history().undo_len(),
                            self.engine.history().redo_len()
                        )));
                        ui.label(dim(" · ".into()));
                        ui.label(dim(format!("Rows: {}", self.engine.rows().len())));
                        ui.label(dim(" · ".into()));
                        ui.label(dim(self.engine.store().describe()));
                    });
                });
            });

        // Left panel: hierarchy table
        let mut table_action = TaskTableAction::None;
        egui::SidePanel::left("task_panel")
            .default_width(ui::theme::TABLE_WIDTH)
            .min_width(240.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                table_action = ui::task_table::show_task_table(&self.engine, self.selected, self.scroll_y, ui);
            });

        match table_action {
            TaskTableAction::Select(key) => self.selected = Some(key),
            TaskTableAction::Toggle(key) => self.engine.toggle_expand(key),
            TaskTableAction::Edit(key) => self.open_date_dialog(key),
            TaskTableAction::None => {}
        }

        // Central panel: Gantt chart
        let options = ChartOptions {
            show_baseline: self.settings.show_baseline,
            show_dependencies: self.settings.show_dependencies,
        };
        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_PANEL)
            .inner_margin(egui::Margin::ZERO);
        let interaction = egui::CentralPanel::default()
            .frame(chart_frame)
            .show(ctx, |ui| {
                ui::gantt_chart::show_gantt_chart(&self.engine, &mut self.drag, self.selected, options, ui)
            })
            .inner;

        self.scroll_y = interaction.scroll_y;
        if let Some(key) = interaction.select {
            self.selected = Some(key);
        } else if interaction.clear_selection {
            self.selected = None;
        }
        if let Some(key) = interaction.toggle {
            self.engine.toggle_expand(key);
        }
        if let Some(key) = interaction.edit {
            self.open_date_dialog(key);
        }
        match interaction.zoom {
            Some(ZoomRequest::In) => self.zoom_in(),
            Some(ZoomRequest::Out) => self.zoom_out(),
            None => {}
        }
        if let Some(outcome) = interaction.commit {
            self.commit(outcome);
        }

        // Dialogs
        if self.date_dialog.is_some() {
            ui::dialogs::show_date_dialog(self, ctx);
        }
        if self.error.is_some() {
            ui::dialogs::show_error_dialog(self, ctx);
        }
        if self.show_about {
            ui::dialogs::show_about_dialog(self, ctx);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.persist_settings();
    }
}
