//! Add / remove profile confirmation windows

use eframe::egui;

use super::LevelApp;
use crate::controller::PluginController;
use crate::theme::colors;

#[derive(Default)]
pub(crate) struct Dialogs {
    add_open: bool,
    new_name: String,
    remove_open: bool,
}

impl Dialogs {
    pub(crate) fn open_add(&mut self) {
        self.add_open = true;
        self.new_name.clear();
    }

    pub(crate) fn open_remove(&mut self) {
        self.remove_open = true;
    }
}

impl LevelApp {
    pub(crate) fn render_dialogs(&mut self, ctx: &egui::Context) {
        let Some(controller) = self.controller.clone() else {
            return;
        };
        let mut effects = Vec::new();

        if self.dialogs.add_open {
            let mut confirm = false;
            let mut close = false;
            egui::Window::new("Add profile")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new("Name").color(colors::TEXT_SECONDARY));
                    let edit = ui.text_edit_singleline(&mut self.dialogs.new_name);
                    let entered = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    ui.horizontal(|ui| {
                        confirm = ui.button("Add").clicked() || entered;
                        close = ui.button("Cancel").clicked();
                    });
                });
            if confirm {
                let name = self.dialogs.new_name.trim().to_string();
                effects.extend(controller.borrow_mut().act(|c| match c {
                    PluginController::Level(l) => l.add_profile(&name),
                    PluginController::Pcb(_) => Ok(Vec::new()),
                }));
            }
            if confirm || close {
                self.dialogs.add_open = false;
            }
        }

        if self.dialogs.remove_open {
            let selected = match &*controller.borrow() {
                PluginController::Level(l) => l.store().selected_name().to_string(),
                PluginController::Pcb(_) => String::new(),
            };
            let mut confirm = false;
            let mut close = false;
            egui::Window::new("Remove profile")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(format!("Remove profile '{}'?", selected));
                    ui.horizontal(|ui| {
                        confirm = ui.button("Remove").clicked();
                        close = ui.button("Cancel").clicked();
                    });
                });
            if confirm {
                effects.extend(controller.borrow_mut().act(|c| match c {
                    PluginController::Level(l) => l.remove_profile(),
                    PluginController::Pcb(_) => Ok(Vec::new()),
                }));
            }
            if confirm || close {
                self.dialogs.remove_open = false;
            }
        }

        self.dispatch(ctx, effects);
    }
}
