//! Sync controllers: reconcile user actions, push messages and I/O completions
//!
//! Controllers never perform I/O. Operations return [`Effect`]s which the
//! runner in [`crate::api`] executes, reporting completions back through
//! [`EffectTarget`]. Follow-on steps (e.g. notifying the server after a save)
//! only run from a successful completion.

mod advanced;
mod simple;

pub use advanced::{LevelController, PROBING_STATUS};
pub use simple::{PcbController, PcbField, PcbForm};

use crate::api::settings_or_default;
use crate::config::PluginKind;
use crate::core::{
    parse_frame, Command, InboundMessage, LevelError, LevelSettings, PcbSettings, ProbeSample,
    SettingsPatch,
};
use crate::grid::{CanvasGeometry, DisplayList, GridRenderer};

/// Renderer used by the controllers
pub type GridView = GridRenderer<DisplayList>;

/// Conceptual controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Saving,
    Probing,
}

/// What to do once a persistence call completes
#[derive(Debug, Clone, PartialEq)]
pub enum Continuation {
    /// Back to idle (plain save)
    Idle,
    /// Enter probing and send the start command
    StartProbe,
    /// Tell the server which profile is active
    NotifyProfileChanged,
    /// Select the freshly added profile
    SelectAdded(String),
    /// Removal persisted
    Removed,
}

/// I/O requested by a controller
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Persist {
        patch: SettingsPatch,
        then: Continuation,
    },
    Send(Command),
}

/// Completion callbacks invoked by the effect runner
pub trait EffectTarget {
    fn on_persisted(&mut self, then: Continuation) -> Vec<Effect>;
    fn on_persist_failed(&mut self, then: Continuation, error: LevelError);
    fn on_command_failed(&mut self, command: Command, error: LevelError);
}

/// The controller for whichever plugin the dashboard drives
pub enum PluginController {
    Level(LevelController),
    Pcb(PcbController),
}

impl PluginController {
    /// Build from the host's full settings document
    pub fn from_settings(
        plugin: PluginKind,
        settings: &serde_json::Value,
        geometry: CanvasGeometry,
    ) -> Result<Self, LevelError> {
        Ok(match plugin {
            PluginKind::LevelAnything => {
                let level: LevelSettings = settings_or_default(settings, plugin.id());
                PluginController::Level(LevelController::new(level.into_store()?, geometry))
            }
            PluginKind::LevelPcb => {
                let pcb: PcbSettings = settings_or_default(settings, plugin.id());
                PluginController::Pcb(PcbController::new(pcb, geometry))
            }
        })
    }

    pub fn kind(&self) -> PluginKind {
        match self {
            PluginController::Level(_) => PluginKind::LevelAnything,
            PluginController::Pcb(_) => PluginKind::LevelPcb,
        }
    }

    /// Route one raw socket frame; frames for other plugins are ignored
    pub fn handle_frame(&mut self, raw: &str) -> bool {
        match parse_frame(raw, self.kind().id()) {
            Some(msg) => {
                self.handle_message(msg);
                true
            }
            None => false,
        }
    }

    pub fn handle_message(&mut self, msg: InboundMessage) {
        match self {
            PluginController::Level(c) => c.handle_message(msg),
            PluginController::Pcb(c) => c.handle_message(msg),
        }
    }

    pub fn save(&mut self) -> Result<Vec<Effect>, LevelError> {
        match self {
            PluginController::Level(c) => c.save(),
            PluginController::Pcb(c) => c.save(),
        }
    }

    pub fn start_probe(&mut self) -> Result<Vec<Effect>, LevelError> {
        match self {
            PluginController::Level(c) => c.start_probe(),
            PluginController::Pcb(c) => c.start_probe(),
        }
    }

    pub fn cancel_probe(&mut self) -> Vec<Effect> {
        match self {
            PluginController::Level(c) => c.cancel_probe(),
            PluginController::Pcb(c) => c.cancel_probe(),
        }
    }

    pub fn samples(&self) -> &[ProbeSample] {
        match self {
            PluginController::Level(c) => c.samples(),
            PluginController::Pcb(c) => c.samples(),
        }
    }

    pub fn grid(&self) -> &GridView {
        match self {
            PluginController::Level(c) => c.grid(),
            PluginController::Pcb(c) => c.grid(),
        }
    }

    pub fn state(&self) -> SyncState {
        match self {
            PluginController::Level(c) => c.state(),
            PluginController::Pcb(c) => c.state(),
        }
    }

    pub fn status_text(&self) -> Option<&str> {
        match self {
            PluginController::Level(c) => c.status_text(),
            PluginController::Pcb(c) => c.status_text(),
        }
    }

    pub fn last_error(&self) -> Option<&LevelError> {
        match self {
            PluginController::Level(c) => c.last_error(),
            PluginController::Pcb(c) => c.last_error(),
        }
    }

    pub fn report(&mut self, error: LevelError) {
        match self {
            PluginController::Level(c) => c.report(error),
            PluginController::Pcb(c) => c.report(error),
        }
    }

    pub fn clear_error(&mut self) {
        match self {
            PluginController::Level(c) => c.clear_error(),
            PluginController::Pcb(c) => c.clear_error(),
        }
    }

    /// Run a fallible action; a refused action is recorded and yields no effects
    pub fn act(
        &mut self,
        action: impl FnOnce(&mut Self) -> Result<Vec<Effect>, LevelError>,
    ) -> Vec<Effect> {
        self.clear_error();
        action(self).unwrap_or_else(|e| {
            self.report(e);
            Vec::new()
        })
    }
}

impl EffectTarget for PluginController {
    fn on_persisted(&mut self, then: Continuation) -> Vec<Effect> {
        match self {
            PluginController::Level(c) => c.on_persisted(then),
            PluginController::Pcb(c) => c.on_persisted(then),
        }
    }

    fn on_persist_failed(&mut self, then: Continuation, error: LevelError) {
        match self {
            PluginController::Level(c) => c.on_persist_failed(then, error),
            PluginController::Pcb(c) => c.on_persist_failed(then, error),
        }
    }

    fn on_command_failed(&mut self, command: Command, error: LevelError) {
        match self {
            PluginController::Level(c) => c.on_command_failed(command, error),
            PluginController::Pcb(c) => c.on_command_failed(command, error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_settings_picks_variant() {
        let doc = json!({ "plugins": { "levelpcb": { "probeWidth": 40, "pointsX": 3 } } });

        let pcb = PluginController::from_settings(PluginKind::LevelPcb, &doc, CanvasGeometry::default()).unwrap();
        let PluginController::Pcb(c) = &pcb else {
            panic!("expected single-grid controller");
        };
        assert_eq!(c.settings().probe_width, 40.0);
        assert_eq!(c.settings().points_x, 3);
        assert_eq!(c.settings().probe_height, 100.0);

        let level = PluginController::from_settings(PluginKind::LevelAnything, &doc, CanvasGeometry::default()).unwrap();
        assert_eq!(level.kind(), PluginKind::LevelAnything);
    }

    #[test]
    fn test_frames_routed_by_plugin_id() {
        let mut ctrl = PluginController::from_settings(
            PluginKind::LevelAnything,
            &json!({}),
            CanvasGeometry::default(),
        )
        .unwrap();

        let other = r#"{"plugin":{"plugin":"levelpcb","data":{"point":[1,2,3]}}}"#;
        let ours = r#"{"plugin":{"plugin":"levelanything","data":{"point":[1,2,3]}}}"#;
        assert!(!ctrl.handle_frame(other));
        assert!(ctrl.handle_frame(ours));
        assert_eq!(ctrl.samples(), &[ProbeSample::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_act_records_refusal() {
        let mut ctrl = PluginController::from_settings(
            PluginKind::LevelAnything,
            &json!({}),
            CanvasGeometry::default(),
        )
        .unwrap();

        let effects = ctrl.act(|c| match c {
            PluginController::Level(l) => l.remove_profile(),
            PluginController::Pcb(_) => Ok(Vec::new()),
        });
        assert!(effects.is_empty());
        assert!(matches!(ctrl.last_error(), Some(LevelError::ReservedProfile(_))));
    }
}
