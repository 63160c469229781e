use egui::{Color32, RichText, Sense, Ui};
use egui_phosphor::regular as icons;

use crate::engine::GanttEngine;
use crate::model::ItemKey;
use crate::store::ScheduleStore;
use crate::ui::theme;

/// Actions that the hierarchy table can request.
pub enum TaskTableAction {
    None,
    Select(ItemKey),
    Toggle(ItemKey),
    Edit(ItemKey),
}

/// Render the left-side hierarchy table. Rows line up with the chart rows;
/// `scroll_y` is the chart's vertical offset from the previous frame.
pub fn show_task_table<S: ScheduleStore>(
    engine: &GanttEngine<S>,
    selected: Option<ItemKey>,
    scroll_y: f32,
    ui: &mut Ui,
) -> TaskTableAction {
    let mut action = TaskTableAction::None;

    egui::ScrollArea::vertical()
        .id_salt("task_table")
        .auto_shrink([false, false])
        .vertical_scroll_offset(scroll_y)
        .enable_scrolling(false)
        .scroll_bar_visibility(egui::scroll_area::ScrollBarVisibility::AlwaysHidden)
        .show(ui, |ui| {
            ui.spacing_mut().item_spacing = egui::vec2(0.0, 0.0);
            let width = ui.available_width();

            // Column headers, same height as the chart's time axis
            let (header, _) = ui.allocate_exact_size(egui::vec2(width, theme::HEADER_HEIGHT), Sense::hover());
            ui.painter().rect_filled(header, 0.0, theme::BG_HEADER);
            for (text, x) in [("NAME", 10.0), ("START", width - 150.0), ("END", width - 100.0), ("DONE", width - 45.0)] {
                ui.painter().text(
                    egui::pos2(header.left() + x, header.center().y + 6.0),
                    egui::Align2::LEFT_CENTER,
                    text,
                    egui::FontId::proportional(9.0),
                    theme::TEXT_DIM,
                );
            }

            if engine.rows().is_empty() {
                ui.add_space(12.0);
                ui.label(RichText::new("   Nothing scheduled").color(theme::TEXT_DIM));
                return;
            }

            for (i, (row, item)) in engine.visible_items().enumerate() {
                let key = row.key;
                let is_selected = selected == Some(key);
                let (rect, response) = ui.allocate_exact_size(egui::vec2(width, row.height), Sense::click());
                let painter = ui.painter_at(rect);

                let row_bg = if is_selected {
                    theme::BG_SELECTED
                } else if response.hovered() {
                    theme::BG_ROW_HOVER
                } else if i % 2 == 0 {
                    theme::BG_ROW_EVEN
                } else {
                    Color32::TRANSPARENT
                };
                painter.rect_filled(rect, 0.0, row_bg);
                painter.line_segment(
                    [rect.left_bottom(), rect.right_bottom()],
                    egui::Stroke::new(0.5, theme::BORDER_SUBTLE),
                );

                let indent = 6.0 + f32::from(key.level.depth() - 1) * theme::INDENT_PER_LEVEL;
                let mid_y = rect.center().y;

                // Expand / collapse caret
                if engine.has_children(key) {
                    let caret = if engine.is_expanded(key) { icons::CARET_DOWN } else { icons::CARET_RIGHT };
                    let caret_rect = egui::Rect::from_center_size(
                        egui::pos2(rect.left() + indent + 7.0, mid_y),
                        egui::vec2(16.0, 16.0),
                    );
                    let caret_resp = ui.interact(caret_rect, ui.make_persistent_id(("caret", key)), Sense::click());
                    painter.text(
                        caret_rect.center(),
                        egui::Align2::CENTER_CENTER,
                        caret,
                        egui::FontId::proportional(13.0),
                        if caret_resp.hovered() { theme::ACCENT } else { theme::TEXT_SECONDARY },
                    );
                    if caret_resp.clicked() {
                        action = TaskTableAction::Toggle(key);
                    }
                }

                // Level swatch and name
                painter.circle_filled(
                    egui::pos2(rect.left() + indent + 20.0, mid_y),
                    3.0,
                    theme::level_color(key.level),
                );
                let name_color = if is_selected {
                    Color32::WHITE
                } else if item.is_overdue(engine.today()) {
                    theme::OVERDUE
                } else {
                    theme::TEXT_PRIMARY
                };
                let name_clip = egui::Rect::from_min_max(rect.min, egui::pos2(rect.right() - 155.0, rect.bottom()));
                painter.with_clip_rect(name_clip).text(
                    egui::pos2(rect.left() + indent + 28.0, mid_y),
                    egui::Align2::LEFT_CENTER,
                    &item.name,
                    if key.level == crate::model::Level::Phase {
                        theme::font_header()
                    } else {
                        theme::font_bar()
                    },
                    name_color,
                );

                // Dates (compact) and progress
                if let Some(span) = item.display_span() {
                    for (date, x) in [(span.start, width - 150.0), (span.end, width - 100.0)] {
                        painter.text(
                            egui::pos2(rect.left() + x, mid_y),
                            egui::Align2::LEFT_CENTER,
                            date.format("%d/%m").to_string(),
                            theme::font_sub(),
                            theme::TEXT_SECONDARY,
                        );
                    }
                }
                painter.text(
                    egui::pos2(rect.left() + width - 45.0, mid_y),
                    egui::Align2::LEFT_CENTER,
                    format!("{:.0}%", item.progress),
                    theme::font_sub(),
                    theme::TEXT_SECONDARY,
                );

                if response.clicked() && !matches!(action, TaskTableAction::Toggle(_)) {
                    action = TaskTableAction::Select(key);
                }
                if response.double_clicked() {
                    action = TaskTableAction::Edit(key);
                }
            }
        });

    action
}
