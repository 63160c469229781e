use egui::{Color32, FontId, Rounding, Stroke, Visuals};

use crate::model::{DependencyKind, Level};

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_ROW_EVEN: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 6);
pub const BG_ROW_HOVER: Color32 = Color32::from_rgba_premultiplied(255, 255, 255, 14);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 45);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(255, 255, 255);

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const TODAY_LINE: Color32 = Color32::from_rgb(240, 75, 75);
pub const GRID_LINE: Color32 = Color32::from_rgb(44, 46, 58);
pub const GRID_LINE_MAJOR: Color32 = Color32::from_rgb(62, 65, 80);
pub const HANDLE_COLOR: Color32 = Color32::from_rgb(255, 255, 255);

pub const PROGRESS_OVERLAY: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 55);
pub const OVERDUE: Color32 = Color32::from_rgb(229, 57, 53);
pub const BASELINE_FILL: Color32 = Color32::from_rgba_premultiplied(110, 110, 120, 90);
pub const DRAG_GHOST: Color32 = Color32::from_rgba_premultiplied(60, 60, 70, 60);

pub const DEP_ARROW: Color32 = Color32::from_rgba_premultiplied(120, 150, 200, 130);
pub const DEP_ARROW_HOVER: Color32 = Color32::from_rgb(170, 200, 250);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const HEADER_HEIGHT: f32 = 44.0;
pub const TABLE_WIDTH: f32 = 340.0;
pub const HANDLE_WIDTH: f32 = 3.0;
pub const BAR_ROUNDING: f32 = 5.0;
pub const INDENT_PER_LEVEL: f32 = 16.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_header() -> FontId {
    FontId::proportional(12.0)
}

pub fn font_sub() -> FontId {
    FontId::proportional(10.5)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

// ── Level and dependency colours ─────────────────────────────────────────────

pub fn level_color(level: Level) -> Color32 {
    match level {
        Level::Phase => Color32::from_rgb(171, 71, 188),
        Level::WorkPackage => Color32::from_rgb(66, 133, 244),
        Level::Task => Color32::from_rgb(52, 168, 83),
        Level::Subtask => Color32::from_rgb(0, 188, 212),
    }
}

/// Stroke colour per dependency kind; finish-to-start keeps the plain colour.
pub fn dependency_color(kind: DependencyKind) -> Color32 {
    match kind {
        DependencyKind::FinishToStart => DEP_ARROW,
        DependencyKind::StartToStart => Color32::from_rgba_premultiplied(80, 150, 110, 130),
        DependencyKind::FinishToFinish => Color32::from_rgba_premultiplied(160, 120, 60, 130),
        DependencyKind::StartToFinish => Color32::from_rgba_premultiplied(150, 80, 140, 130),
    }
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = Color32::from_rgb(20, 20, 28);

    let rounding = Rounding::same(4.0);
    let widgets = &mut visuals.widgets;
    widgets.noninteractive.bg_fill = BG_PANEL;
    widgets.noninteractive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    widgets.inactive.bg_fill = Color32::from_rgb(42, 44, 56);
    widgets.inactive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    widgets.hovered.bg_fill = Color32::from_rgb(52, 54, 68);
    widgets.hovered.bg_stroke = Stroke::new(1.0, ACCENT);
    widgets.active.bg_fill = Color32::from_rgb(60, 62, 76);
    widgets.active.bg_stroke = Stroke::new(1.0, ACCENT);
    widgets.open.bg_fill = Color32::from_rgb(50, 52, 66);
    for w in [
        &mut widgets.noninteractive,
        &mut widgets.inactive,
        &mut widgets.hovered,
        &mut widgets.active,
        &mut widgets.open,
    ] {
        w.rounding = rounding;
    }

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);
    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.striped = false;
    visuals.faint_bg_color = BG_PANEL;

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}

/// Register the Phosphor icon font next to the default fonts.
pub fn install_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
    ctx.set_fonts(fonts);
}
