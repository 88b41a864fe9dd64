//! Settings panel: profile selector, field editors and action buttons

use eframe::egui;

use super::LevelApp;
use crate::controller::{Effect, LevelController, PcbController, PcbField, PluginController};
use crate::core::{FieldKind, ProfileField};
use crate::theme::colors;

/// Button presses collected while the controller is borrowed
#[derive(Default)]
struct Actions {
    select: Option<String>,
    save: bool,
    start: bool,
    cancel: bool,
    add: bool,
    remove: bool,
}

impl LevelApp {
    pub(crate) fn render_panel(&mut self, ui: &mut egui::Ui) {
        let Some(controller) = self.controller.clone() else {
            return;
        };

        let mut actions = Actions::default();
        {
            let mut controller = controller.borrow_mut();
            match &mut *controller {
                PluginController::Level(c) => level_panel(ui, c, &mut actions),
                PluginController::Pcb(c) => pcb_panel(ui, c),
            }
            ui.add_space(8.0);
            action_buttons(ui, &controller, &mut actions);
        }

        if actions.add {
            self.dialogs.open_add();
        }
        if actions.remove {
            self.dialogs.open_remove();
        }

        let effects: Vec<Effect> = {
            let mut c = controller.borrow_mut();
            let mut effects = Vec::new();
            if let Some(name) = actions.select {
                effects.extend(c.act(|c| match c {
                    PluginController::Level(l) => l.select_profile(&name),
                    PluginController::Pcb(_) => Ok(Vec::new()),
                }));
            }
            if actions.save {
                effects.extend(c.act(PluginController::save));
            }
            if actions.start {
                effects.extend(c.act(PluginController::start_probe));
            }
            if actions.cancel {
                effects.extend(c.cancel_probe());
            }
            effects
        };
        self.dispatch(ui.ctx(), effects);
    }
}

fn level_panel(ui: &mut egui::Ui, c: &mut LevelController, actions: &mut Actions) {
    let selected = c.store().selected_name().to_string();
    let names: Vec<String> = c.store().names().map(str::to_string).collect();

    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Profile").color(colors::TEXT_SECONDARY));
        egui::ComboBox::from_id_salt("profile")
            .selected_text(selected.as_str())
            .show_ui(ui, |ui| {
                for name in &names {
                    if ui.selectable_label(*name == selected, name.as_str()).clicked() && *name != selected {
                        actions.select = Some(name.clone());
                    }
                }
            });
        if ui.button("Add").clicked() {
            actions.add = true;
        }
        if ui
            .add_enabled(!c.is_disabled(), egui::Button::new("Remove"))
            .clicked()
        {
            actions.remove = true;
        }
    });

    if c.is_disabled() {
        ui.label(egui::RichText::new("Leveling disabled").color(colors::TEXT_MUTED));
        return;
    }

    let busy = c.is_busy();
    ui.add_space(4.0);
    egui::Grid::new("profile_fields")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            let form = c.form_mut();
            for &field in ProfileField::ALL {
                ui.label(egui::RichText::new(field.label()).color(colors::TEXT_SECONDARY));
                ui.add_enabled_ui(!busy, |ui| match field.kind() {
                    FieldKind::Flag => {
                        if let Some(flag) = form.flag_mut(field) {
                            ui.checkbox(flag, "");
                        }
                    }
                    FieldKind::Float | FieldKind::Int => {
                        if let Some(text) = form.text_mut(field) {
                            ui.add(egui::TextEdit::singleline(text).desired_width(80.0));
                        }
                    }
                });
                ui.end_row();
            }
        });
}

fn pcb_panel(ui: &mut egui::Ui, c: &mut PcbController) {
    let busy = c.is_busy();
    egui::Grid::new("pcb_fields")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            let form = c.form_mut();
            for &field in PcbField::ALL {
                ui.label(egui::RichText::new(field.label()).color(colors::TEXT_SECONDARY));
                ui.add_enabled(
                    !busy,
                    egui::TextEdit::singleline(form.text_mut(field)).desired_width(80.0),
                );
                ui.end_row();
            }
        });
}

fn action_buttons(ui: &mut egui::Ui, controller: &PluginController, actions: &mut Actions) {
    let probing = controller.state() == crate::controller::SyncState::Probing;
    let idle = controller.state() == crate::controller::SyncState::Idle;
    let disabled = matches!(controller, PluginController::Level(c) if c.is_disabled());

    ui.horizontal(|ui| {
        if ui.add_enabled(idle && !disabled, egui::Button::new("Save")).clicked() {
            actions.save = true;
        }
        if ui
            .add_enabled(idle && !disabled, egui::Button::new("Start probing"))
            .clicked()
        {
            actions.start = true;
        }
        if ui.add_enabled(probing, egui::Button::new("Cancel")).clicked() {
            actions.cancel = true;
        }
    });
}
