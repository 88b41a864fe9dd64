//! Minimal black & white theme; the probe grid itself is drawn dark-on-light

use egui::Color32;

/// Greyscale chrome plus three state colors
pub mod colors {
    use super::Color32;

    // === Backgrounds ===
    pub const BG_PRIMARY: Color32 = Color32::from_rgb(0, 0, 0);           // #000000 - panels
    pub const BG_ELEVATED: Color32 = Color32::from_rgb(12, 12, 12);       // #0C0C0C - dialogs
    pub const BG_HOVER: Color32 = Color32::from_rgb(24, 24, 24);          // #181818 - pressed widgets

    // === Text ===
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(255, 255, 255);   // #FFFFFF - values
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(160, 160, 160); // #A0A0A0 - field labels
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(80, 80, 80);        // #505050 - disabled hints

    // === Lines & Borders ===
    pub const BORDER: Color32 = Color32::from_rgb(40, 40, 40);            // #282828

    // === Sync / socket state ===
    pub const OK: Color32 = Color32::from_rgb(100, 200, 100);             // idle, connected
    pub const BUSY: Color32 = Color32::from_rgb(200, 200, 100);           // saving, probing
    pub const ERROR: Color32 = Color32::from_rgb(200, 100, 100);          // failed action

    // === Probe grid ===
    // Renderer styles carry their own stroke and text colors on top of this
    pub const GRID_BG: Color32 = Color32::from_rgb(255, 255, 255);        // #FFFFFF - canvas fill
}

/// Convert a renderer style color
pub fn rgb(c: [u8; 3]) -> Color32 {
    Color32::from_rgb(c[0], c[1], c[2])
}

/// Dark egui visuals for everything around the grid
pub fn minimal_visuals() -> egui::Visuals {
    use colors::*;

    let mut visuals = egui::Visuals::dark();

    // Black panels, dialogs one step lighter
    visuals.panel_fill = BG_PRIMARY;
    visuals.window_fill = BG_ELEVATED;
    visuals.extreme_bg_color = BG_PRIMARY;
    visuals.faint_bg_color = BG_ELEVATED;

    visuals.override_text_color = Some(TEXT_PRIMARY);

    // Widgets stay greyscale; state colors only appear in the header
    visuals.widgets.noninteractive.bg_fill = BG_PRIMARY;
    visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, TEXT_MUTED);
    visuals.widgets.noninteractive.bg_stroke = egui::Stroke::new(1.0, BORDER);

    visuals.widgets.inactive.bg_fill = BG_PRIMARY;
    visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, TEXT_SECONDARY);
    visuals.widgets.inactive.bg_stroke = egui::Stroke::new(1.0, BORDER);
    visuals.widgets.inactive.weak_bg_fill = BG_PRIMARY;

    visuals.widgets.hovered.bg_fill = BG_ELEVATED;
    visuals.widgets.hovered.fg_stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, TEXT_MUTED);
    visuals.widgets.hovered.weak_bg_fill = BG_ELEVATED;

    visuals.widgets.active.bg_fill = BG_HOVER;
    visuals.widgets.active.fg_stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.active.bg_stroke = egui::Stroke::new(1.0, TEXT_SECONDARY);
    visuals.widgets.active.weak_bg_fill = BG_HOVER;

    // Selected combo entries and text
    visuals.selection.bg_fill = Color32::from_rgb(60, 60, 60);
    visuals.selection.stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);

    // Flat
    visuals.window_shadow = egui::Shadow::NONE;
    visuals.popup_shadow = egui::Shadow::NONE;

    visuals
}
