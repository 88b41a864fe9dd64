//! Header bar: plugin, probing state, status text, socket state, last error

use eframe::egui;

use super::LevelApp;
use crate::controller::SyncState;
use crate::theme::colors;
use crate::ws_state::WsState;

impl LevelApp {
    pub(crate) fn render_header(&mut self, ui: &mut egui::Ui) {
        let ws_state = self.ws_state.borrow().clone();

        let (state, status, error) = match &self.controller {
            Some(c) => {
                let c = c.borrow();
                (
                    Some(c.state()),
                    c.status_text().map(str::to_string),
                    c.last_error().map(|e| e.to_string()),
                )
            }
            None => (None, None, None),
        };

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(self.config.plugin.id()).color(colors::TEXT_PRIMARY));

            if let Some(state) = state {
                ui.label(egui::RichText::new("/").color(colors::TEXT_MUTED));
                let (color, text) = match state {
                    SyncState::Idle => (colors::TEXT_SECONDARY, "Idle"),
                    SyncState::Saving => (colors::BUSY, "Saving..."),
                    SyncState::Probing => (colors::BUSY, "Probing"),
                };
                ui.colored_label(color, text);
            }

            if let Some(status) = status {
                ui.label(egui::RichText::new("/").color(colors::TEXT_MUTED));
                ui.label(egui::RichText::new(status).color(colors::TEXT_SECONDARY));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let color = match &ws_state {
                    WsState::Connected => colors::OK,
                    WsState::Connecting => colors::BUSY,
                    WsState::Disconnected | WsState::Error(_) => colors::ERROR,
                };
                ui.colored_label(color, ws_state.label());
            });
        });

        if let Some(error) = error {
            ui.horizontal(|ui| {
                ui.colored_label(colors::ERROR, error);
                if ui.small_button("x").clicked() {
                    if let Some(c) = &self.controller {
                        c.borrow_mut().clear_error();
                    }
                }
            });
        }
    }
}
