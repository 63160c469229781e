use egui::epaint::CubicBezierShape;
use egui::{Color32, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};

use crate::engine::axis::{axis_layout, AxisLayout};
use crate::engine::bar::{self, BarGeometry, EDGE_HIT_ZONE};
use crate::engine::dependency::ENDPOINT_RADIUS;
use crate::engine::{Connector, DragHandle, DragOutcome, GanttEngine, Point, TaskBarDrag};
use crate::model::ItemKey;
use crate::store::ScheduleStore;
use crate::ui::theme;

const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
/// How close the pointer must be to a connector to highlight it.
const CONNECTOR_HOVER_PX: f32 = 4.0;

#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub show_baseline: bool,
    pub show_dependencies: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomRequest {
    In,
    Out,
}

/// What happened in the chart this frame. The app applies it after painting.
#[derive(Debug, Clone, Default)]
pub struct ChartInteraction {
    /// A finished drag whose dates should be persisted.
    pub commit: Option<DragOutcome>,
    pub select: Option<ItemKey>,
    pub clear_selection: bool,
    pub toggle: Option<ItemKey>,
    /// Open the date dialog for this item.
    pub edit: Option<ItemKey>,
    pub zoom: Option<ZoomRequest>,
    /// Vertical scroll offset, mirrored by the hierarchy table.
    pub scroll_y: f32,
}

/// Render the Gantt chart area (right panel).
pub fn show_gantt_chart<S: ScheduleStore>(
    engine: &GanttEngine<S>,
    drag: &mut TaskBarDrag,
    selected: Option<ItemKey>,
    options: ChartOptions,
    ui: &mut Ui,
) -> ChartInteraction {
    let mut interaction = ChartInteraction::default();
    let timeline = engine.timeline();
    let available = ui.available_size();
    let chart_width = timeline.width().max(available.x);
    let chart_height = HEADER_HEIGHT + engine.total_height() + 40.0;

    // Ctrl + wheel zooms
    let scroll_delta = ui.input(|i| i.smooth_scroll_delta);
    if ui.rect_contains_pointer(ui.max_rect()) && ui.input(|i| i.modifiers.ctrl) {
        if scroll_delta.y > 0.0 {
            interaction.zoom = Some(ZoomRequest::In);
        } else if scroll_delta.y < 0.0 {
            interaction.zoom = Some(ZoomRequest::Out);
        }
    }

    let output = egui::ScrollArea::both()
        .id_salt("gantt_chart")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(
                Vec2::new(chart_width, chart_height.max(available.y)),
                Sense::click(),
            );
            let origin = response.rect.min;
            let rows_origin = origin + Vec2::new(0.0, HEADER_HEIGHT);
            let mut consumed_click = false;

            painter.rect_filled(response.rect, 0.0, theme::BG_PANEL);

            // Row stripes and separators
            for (i, row) in engine.rows().iter().enumerate() {
                let rect = Rect::from_min_size(
                    rows_origin + Vec2::new(0.0, row.y),
                    Vec2::new(chart_width, row.height),
                );
                if selected == Some(row.key) {
                    painter.rect_filled(rect, 0.0, theme::BG_SELECTED);
                } else if i % 2 == 0 {
                    painter.rect_filled(rect, 0.0, theme::BG_ROW_EVEN);
                }
                painter.line_segment(
                    [rect.left_bottom(), rect.right_bottom()],
                    Stroke::new(0.5, theme::BORDER_SUBTLE),
                );
            }

            let axis = axis_layout(timeline, engine.today());
            draw_grid(&painter, origin, &axis, response.rect.bottom());
            draw_timeline_header(&painter, origin, &axis, chart_width);

            // Baseline overlay under the bars
            if options.show_baseline {
                for row in engine.rows() {
                    if let Some((min, max)) = engine.baseline_bar(row.key) {
                        painter.rect_filled(
                            Rect::from_min_max(to_screen(rows_origin, min), to_screen(rows_origin, max)),
                            Rounding::same(2.0),
                            theme::BASELINE_FILL,
                        );
                    }
                }
            }

            // Bars
            let pointer = ui.input(|i| i.pointer.hover_pos());
            for row in engine.rows() {
                let key = row.key;
                let preview = drag.preview(key);
                let geometry = match preview {
                    Some(span) => engine.bar_with_span(key, span),
                    None => engine.bar(key),
                };
                let Some(geometry) = geometry else {
                    continue;
                };
                let Some(item) = engine.item(key) else {
                    continue;
                };

                // Ghost of the committed dates while dragging
                if preview.is_some() {
                    if let Some(original) = engine.bar(key) {
                        painter.rect_filled(
                            bar_rect(rows_origin, &original),
                            Rounding::same(theme::BAR_ROUNDING),
                            theme::DRAG_GHOST,
                        );
                    }
                }

                let rect = draw_task_bar(&painter, rows_origin, &geometry, &item.name, selected == Some(key));
                let response = ui.interact(
                    rect.expand2(Vec2::new(EDGE_HIT_ZONE, 0.0)),
                    ui.make_persistent_id(("bar", key)),
                    Sense::click_and_drag(),
                );

                if response.drag_started() {
                    if let (Some(pos), Some(span)) = (response.interact_pointer_pos(), item.display_span()) {
                        let x = pos.x - origin.x;
                        let handle = bar::hit_test(&geometry, x);
                        drag.on_down(key, handle, x, span, timeline.pixels_per_day());
                    }
                    interaction.select = Some(key);
                    consumed_click = true;
                }
                if response.dragged() {
                    if let Some(pos) = response.interact_pointer_pos() {
                        drag.on_move(pos.x - origin.x);
                    }
                }
                if response.drag_stopped() {
                    interaction.commit = drag.on_up();
                }

                if response.clicked() {
                    interaction.select = Some(key);
                    consumed_click = true;
                }
                if response.double_clicked() {
                    interaction.edit = Some(key);
                }

                let hovered_handle = pointer
                    .filter(|_| response.hovered())
                    .map(|p| bar::hit_test(&geometry, p.x - origin.x));
                match hovered_handle {
                    Some(DragHandle::Start | DragHandle::End) => {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                    }
                    Some(DragHandle::Move) if drag.is_dragging() => {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
                    }
                    Some(DragHandle::Move) => {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
                    }
                    None => {}
                }
                if hovered_handle.is_some() || selected == Some(key) {
                    draw_handles(&painter, rect);
                }

                response.context_menu(|ui| {
                    if ui.button("Edit dates…").clicked() {
                        interaction.edit = Some(key);
                        ui.close_menu();
                    }
                    if engine.has_children(key) {
                        let label = if engine.is_expanded(key) { "Collapse" } else { "Expand" };
                        if ui.button(label).clicked() {
                            interaction.toggle = Some(key);
                            ui.close_menu();
                        }
                    }
                });

                if response.hovered() && !drag.is_dragging() {
                    egui::show_tooltip_at_pointer(
                        ui.ctx(),
                        ui.layer_id(),
                        egui::Id::new(("bar-tip", key)),
                        |ui| {
                            ui.strong(&item.name);
                            ui.label(key.level.label());
                            if let Some(span) = item.display_span() {
                                ui.label(format!(
                                    "{} → {} ({} days)",
                                    span.start.format("%d/%m/%Y"),
                                    span.end.format("%d/%m/%Y"),
                                    span.days()
                                ));
                            }
                            ui.label(format!("Progress: {:.0}%", item.progress));
                            if let Some(responsible) = &item.responsible {
                                ui.label(format!("Responsible: {responsible}"));
                            }
                            if let Some(days) = engine.variance_days(key) {
                                ui.label(format!("Variance vs baseline: {days:+} days"));
                            }
                        },
                    );
                }
            }

            if options.show_dependencies {
                let local_pointer = pointer.map(|p| Point::new(p.x - rows_origin.x, p.y - rows_origin.y));
                for connector in engine.connectors_with(|key| drag.preview(key)) {
                    let hovered = local_pointer
                        .is_some_and(|p| connector.distance_to(p) <= CONNECTOR_HOVER_PX);
                    draw_connector(&painter, rows_origin, &connector, hovered);
                    if hovered && !drag.is_dragging() {
                        egui::show_tooltip_at_pointer(
                            ui.ctx(),
                            ui.layer_id(),
                            egui::Id::new(("dep-tip", connector.dependency_id)),
                            |ui| {
                                let name = |key: ItemKey| engine.item(key).map(|i| i.name.as_str()).unwrap_or("?");
                                if let Some(dep) = engine.dependencies().iter().find(|d| d.id == connector.dependency_id) {
                                    ui.label(format!(
                                        "{} → {} ({})",
                                        name(dep.from),
                                        name(dep.to),
                                        dep.kind.short_label()
                                    ));
                                }
                            },
                        );
                    }
                }
            }

            if let Some(x) = axis.today_x {
                draw_today_line(&painter, origin, origin.x + x, response.rect.bottom());
            }

            // Empty click on background clears selection
            if response.clicked() && !consumed_click {
                interaction.clear_selection = true;
            }
        });

    interaction.scroll_y = output.state.offset.y;
    interaction
}

fn to_screen(rows_origin: Pos2, p: Point) -> Pos2 {
    rows_origin + Vec2::new(p.x, p.y)
}

fn bar_rect(rows_origin: Pos2, geometry: &BarGeometry) -> Rect {
    Rect::from_min_size(
        rows_origin + Vec2::new(geometry.x, geometry.y),
        Vec2::new(geometry.width.max(2.0), geometry.height),
    )
}

fn draw_grid(painter: &egui::Painter, origin: Pos2, axis: &AxisLayout, bottom: f32) {
    for tick in &axis.minor {
        let x = origin.x + tick.x;
        painter.line_segment(
            [Pos2::new(x, origin.y + HEADER_HEIGHT), Pos2::new(x, bottom)],
            Stroke::new(0.5, theme::GRID_LINE),
        );
    }
    for tick in &axis.major {
        let x = origin.x + tick.x;
        painter.line_segment(
            [Pos2::new(x, origin.y + HEADER_HEIGHT), Pos2::new(x, bottom)],
            Stroke::new(1.0, theme::GRID_LINE_MAJOR),
        );
    }
}

fn draw_timeline_header(painter: &egui::Painter, origin: Pos2, axis: &AxisLayout, width: f32) {
    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    for tick in &axis.major {
        let x = origin.x + tick.x;
        painter.line_segment(
            [Pos2::new(x, origin.y), Pos2::new(x, origin.y + HEADER_HEIGHT / 2.0)],
            Stroke::new(1.0, theme::GRID_LINE_MAJOR),
        );
        if let Some(label) = &tick.label {
            painter.text(
                Pos2::new(x + 4.0, origin.y + 12.0),
                egui::Align2::LEFT_CENTER,
                label,
                theme::font_header(),
                theme::TEXT_PRIMARY,
            );
        }
    }
    for tick in &axis.minor {
        if let Some(label) = &tick.label {
            painter.text(
                Pos2::new(origin.x + tick.x + 3.0, origin.y + 30.0),
                egui::Align2::LEFT_CENTER,
                label,
                theme::font_sub(),
                theme::TEXT_SECONDARY,
            );
        }
    }
}

fn draw_today_line(painter: &egui::Painter, origin: Pos2, x: f32, bottom: f32) {
    painter.line_segment(
        [Pos2::new(x, origin.y + HEADER_HEIGHT), Pos2::new(x, bottom)],
        Stroke::new(1.5, theme::TODAY_LINE),
    );

    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, origin.y + HEADER_HEIGHT - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge_rect, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge_rect.center(),
        egui::Align2::CENTER_CENTER,
        "Today",
        egui::FontId::proportional(9.5),
        Color32::WHITE,
    );
}

fn draw_task_bar(
    painter: &egui::Painter,
    rows_origin: Pos2,
    geometry: &BarGeometry,
    name: &str,
    is_selected: bool,
) -> Rect {
    let rect = bar_rect(rows_origin, geometry);
    let rounding = Rounding::same(theme::BAR_ROUNDING);
    let color = theme::level_color(geometry.level());

    // Soft shadow
    painter.rect_filled(rect.translate(Vec2::new(1.0, 2.0)), rounding, Color32::from_black_alpha(35));

    painter.rect_filled(rect, rounding, color);
    let highlight_rect = Rect::from_min_size(rect.min, Vec2::new(rect.width(), (rect.height() * 0.45).max(4.0)));
    painter.rect_filled(
        highlight_rect,
        Rounding {
            nw: theme::BAR_ROUNDING,
            ne: theme::BAR_ROUNDING,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_white_alpha(25),
    );

    // Progress fill (darkened overlay)
    if geometry.progress_width > 0.0 {
        let progress_rect = Rect::from_min_size(rect.min, Vec2::new(geometry.progress_width, rect.height()));
        painter.rect_filled(progress_rect, rounding, theme::PROGRESS_OVERLAY);
    }

    if geometry.overdue {
        painter.rect_stroke(rect, rounding, Stroke::new(1.5, theme::OVERDUE));
    }
    if is_selected {
        painter.rect_stroke(
            rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::ACCENT),
        );
    }

    // Name on the bar, clipped to it
    if rect.width() > 30.0 {
        let galley = painter.layout_no_wrap(name.to_string(), theme::font_bar(), theme::TEXT_ON_BAR);
        let text_y = rect.top() + (rect.height() - galley.size().y) / 2.0;
        painter
            .with_clip_rect(rect)
            .galley(Pos2::new(rect.left() + 6.0, text_y), galley, Color32::TRANSPARENT);
    }

    rect
}

fn draw_handles(painter: &egui::Painter, rect: Rect) {
    let handle_h = rect.height() * 0.55;
    let handle_y = rect.center().y - handle_h / 2.0;
    for x in [rect.left() - 1.5, rect.right() - 2.5] {
        painter.rect_filled(
            Rect::from_min_size(Pos2::new(x, handle_y), Vec2::new(theme::HANDLE_WIDTH + 1.0, handle_h)),
            Rounding::same(2.0),
            theme::HANDLE_COLOR,
        );
    }
}

fn draw_connector(painter: &egui::Painter, rows_origin: Pos2, connector: &Connector, hovered: bool) {
    let color = if hovered {
        theme::DEP_ARROW_HOVER
    } else {
        theme::dependency_color(connector.kind)
    };
    let width = if hovered { 2.0 } else { 1.5 };
    let points = connector.control_points().map(|p| to_screen(rows_origin, p));

    painter.add(CubicBezierShape::from_points_stroke(
        points,
        false,
        Color32::TRANSPARENT,
        Stroke::new(width, color),
    ));
    painter.add(egui::Shape::convex_polygon(
        connector.arrow.map(|p| to_screen(rows_origin, p)).to_vec(),
        color,
        Stroke::NONE,
    ));
    for point in connector.endpoints() {
        painter.circle_filled(to_screen(rows_origin, point), ENDPOINT_RADIUS, color);
    }
}
