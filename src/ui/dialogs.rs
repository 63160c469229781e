use chrono::NaiveDate;
use egui::{Color32, Context, RichText, Window};

use crate::app::GanttApp;
use crate::model::ItemKey;
use crate::ui::theme;

/// Dates being edited in the "Edit dates" dialog.
#[derive(Debug, Clone)]
pub struct DateDialog {
    pub key: ItemKey,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub original_start: NaiveDate,
    pub original_end: NaiveDate,
}

impl DateDialog {
    pub fn new(key: ItemKey, name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            key,
            name: name.into(),
            start,
            end,
            original_start: start,
            original_end: end,
        }
    }

    /// A dialog that only moves the start or the end is a resize; anything
    /// else that keeps the length is a move.
    pub fn is_move(&self) -> bool {
        self.end - self.start == self.original_end - self.original_start
    }

    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }
}

/// Render the "Edit dates" dialog.
pub fn show_date_dialog(app: &mut GanttApp, ctx: &Context) {
    let Some(dialog) = app.date_dialog.as_mut() else {
        return;
    };
    let mut should_close = false;
    let mut should_save = false;

    Window::new(RichText::new("Edit dates").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([300.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(4.0);
            ui.label(RichText::new(&dialog.name).strong());
            ui.label(RichText::new(dialog.key.level.label()).color(theme::TEXT_SECONDARY));
            ui.add_space(6.0);

            egui::Grid::new("date_dialog_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Start").color(theme::TEXT_SECONDARY));
                    ui.add(egui_extras::DatePickerButton::new(&mut dialog.start).id_salt("dlg_dp_start"));
                    ui.end_row();

                    ui.label(RichText::new("End").color(theme::TEXT_SECONDARY));
                    ui.add(egui_extras::DatePickerButton::new(&mut dialog.end).id_salt("dlg_dp_end"));
                    ui.end_row();
                });

            if !dialog.is_valid() {
                ui.add_space(4.0);
                ui.label(RichText::new("End must be after start").color(theme::OVERDUE));
            }

            ui.add_space(6.0);
            ui.separator();
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                let save_btn = egui::Button::new(RichText::new("Save").color(Color32::WHITE))
                    .fill(theme::ACCENT)
                    .rounding(egui::Rounding::same(4.0));
                if ui.add_enabled(dialog.is_valid(), save_btn).clicked() {
                    should_save = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
                    should_close = true;
                }
            });
            ui.add_space(2.0);
        });

    if should_save {
        app.save_date_dialog();
    } else if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.date_dialog = None;
    }
}

/// Render the error window for failed saves.
pub fn show_error_dialog(app: &mut GanttApp, ctx: &Context) {
    let Some(message) = app.error.as_ref() else {
        return;
    };
    let mut should_close = false;
    Window::new(RichText::new("Could not save").strong().color(theme::OVERDUE))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([360.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(4.0);
            ui.label(message);
            ui.add_space(4.0);
            ui.label(RichText::new("The chart shows the last saved dates.").color(theme::TEXT_SECONDARY));
            ui.add_space(8.0);
            if ui.add_sized([80.0, 28.0], egui::Button::new("OK")).clicked() {
                should_close = true;
            }
        });
    if should_close {
        app.error = None;
    }
}

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut GanttApp, ctx: &Context) {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([280.0, 170.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Schedule Gantt").strong());
                ui.add_space(2.0);
                ui.label(RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION"))).color(theme::TEXT_SECONDARY));
                ui.add_space(10.0);
                ui.label("Phases, work packages, tasks and subtasks");
                ui.label("on one timeline.");
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_about = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn same_length_edits_are_moves() {
        let mut dialog = DateDialog::new(ItemKey::task(1), "Pour", d(1), d(4));
        dialog.start = d(3);
        dialog.end = d(6);
        assert!(dialog.is_move());
        dialog.end = d(9);
        assert!(!dialog.is_move());
    }

    #[test]
    fn end_must_follow_start() {
        let mut dialog = DateDialog::new(ItemKey::phase(2), "Build", d(1), d(4));
        dialog.end = d(1);
        assert!(!dialog.is_valid());
    }
}
