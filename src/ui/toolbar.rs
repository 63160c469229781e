use egui::{menu, RichText, Ui};
use egui_phosphor::regular as icons;

use crate::app::GanttApp;
use crate::config::Backend;
use crate::model::TimelineScale;

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button("  File  ", |ui| {
            if ui.button(format!("{}  Demo schedule", icons::SPARKLE)).clicked() {
                app.switch_backend(Backend::Demo);
                ui.close_menu();
            }
            if ui.button(format!("{}  Open data folder…", icons::FOLDER_OPEN)).clicked() {
                app.open_data_folder();
                ui.close_menu();
            }
            if ui
                .add_enabled(
                    !app.settings.api_base_url.is_empty(),
                    egui::Button::new(format!("{}  Connect to API", icons::CLOUD)),
                )
                .on_hover_text(&app.settings.api_base_url)
                .clicked()
            {
                app.switch_backend(Backend::Rest);
                ui.close_menu();
            }
            ui.separator();
            if ui.button(format!("{}  Reload          Ctrl+R", icons::ARROWS_CLOCKWISE)).clicked() {
                app.reload();
                ui.close_menu();
            }
            if ui.button(format!("{}  Export CSV…", icons::EXPORT)).clicked() {
                app.export_csv();
                ui.close_menu();
            }
            if ui
                .add_enabled(
                    app.settings.data_dir.is_some(),
                    egui::Button::new(format!("{}  Show data folder", icons::FOLDER)),
                )
                .clicked()
            {
                app.reveal_data_folder();
                ui.close_menu();
            }
        });

        ui.menu_button("  Edit  ", |ui| {
            if ui
                .add_enabled(app.engine.can_undo(), egui::Button::new("  Undo          Ctrl+Z"))
                .clicked()
            {
                app.undo();
                ui.close_menu();
            }
            if ui
                .add_enabled(app.engine.can_redo(), egui::Button::new("  Redo          Ctrl+Y"))
                .clicked()
            {
                app.redo();
                ui.close_menu();
            }
            ui.separator();
            if ui
                .add_enabled(app.selected.is_some(), egui::Button::new("  Edit dates…"))
                .clicked()
            {
                if let Some(key) = app.selected {
                    app.open_date_dialog(key);
                }
                ui.close_menu();
            }
        });

        ui.menu_button("  View  ", |ui| {
            if ui.button("  Zoom In        Ctrl+Scroll ↑").clicked() {
                app.zoom_in();
                ui.close_menu();
            }
            if ui.button("  Zoom Out      Ctrl+Scroll ↓").clicked() {
                app.zoom_out();
                ui.close_menu();
            }
            ui.separator();
            ui.label(RichText::new("Timeline Scale").small().weak());
            let current = app.engine.timeline().scale;
            for scale in [TimelineScale::Days, TimelineScale::Weeks, TimelineScale::Months] {
                if ui.radio(current == scale, scale.label()).clicked() {
                    app.set_scale(scale);
                    ui.close_menu();
                }
            }
            ui.separator();
            if ui.button(format!("{}  Expand all", icons::ARROWS_OUT_LINE_VERTICAL)).clicked() {
                app.engine.expand_all();
                ui.close_menu();
            }
            if ui.button(format!("{}  Collapse all", icons::ARROWS_IN_LINE_VERTICAL)).clicked() {
                app.engine.collapse_all();
                ui.close_menu();
            }
            ui.separator();
            if ui.checkbox(&mut app.settings.show_baseline, "Baseline overlay").changed() {
                app.persist_settings();
            }
            if ui.checkbox(&mut app.settings.show_dependencies, "Dependencies").changed() {
                app.persist_settings();
            }
        });

        ui.menu_button("  Help  ", |ui| {
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        // Right-aligned schedule name
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let name = app
                .engine
                .schedule()
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "No schedule".to_string());
            ui.label(
                RichText::new(format!("{name} · {}", app.settings.backend.label()))
                    .size(11.0)
                    .weak(),
            );
        });
    });
}
