//! Host API access and the effect runner
//!
//! Controllers hand back [`Effect`]s; [`run_effects`] performs them against a
//! [`Backend`] and feeds completions into the controller. The controller is
//! only borrowed between awaits, never across one.

#[cfg(all(feature = "cli", not(target_arch = "wasm32")))]
mod http;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
mod browser;

#[cfg(all(feature = "cli", not(target_arch = "wasm32")))]
pub use http::OctoPrintClient;
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use browser::BrowserClient;

use std::cell::RefCell;
use std::collections::VecDeque;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::controller::{Effect, EffectTarget};
use crate::core::{Command, LevelError, SettingsPatch};

/// Host endpoints used by the dashboard, bound to one plugin id
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Full settings document
    async fn load_settings(&self) -> Result<Value, LevelError>;
    /// Write one plugin-scoped patch
    async fn save_settings(&self, patch: &SettingsPatch) -> Result<(), LevelError>;
    /// Post a command to the plugin endpoint
    async fn post_command(&self, command: &Command) -> Result<(), LevelError>;
}

/// Passive login answer; identifies the socket session
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginSession {
    pub name: String,
    pub session: String,
}

impl LoginSession {
    /// First frame sent on the push socket
    pub fn auth_message(&self) -> String {
        json!({ "auth": format!("{}:{}", self.name, self.session) }).to_string()
    }
}

/// Body of the passive login request
pub fn login_request() -> Value {
    json!({ "passive": true })
}

/// Execute effects in order, including follow-ups produced by completions
pub async fn run_effects<C, B>(target: &RefCell<C>, backend: &B, effects: Vec<Effect>)
where
    C: EffectTarget,
    B: Backend,
{
    let mut queue: VecDeque<Effect> = effects.into();
    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::Persist { patch, then } => {
                let result = backend.save_settings(&patch).await;
                match result {
                    Ok(()) => {
                        debug!(?then, "Settings saved");
                        let next = target.borrow_mut().on_persisted(then);
                        queue.extend(next);
                    }
                    Err(e) => {
                        target.borrow_mut().on_persist_failed(then, e);
                        // nothing queued behind a failed save may run
                        if !queue.is_empty() {
                            warn!(dropped = queue.len(), "Skipping effects after failed save");
                            queue.clear();
                        }
                    }
                }
            }
            Effect::Send(command) => {
                let result = backend.post_command(&command).await;
                if let Err(e) = result {
                    target.borrow_mut().on_command_failed(command, e);
                }
            }
        }
    }
}

/// Plugin-scoped settings section, or the defaults when the host has none
pub fn settings_or_default<T>(settings: &Value, plugin_id: &str) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    crate::core::plugin_section(settings, plugin_id).unwrap_or_else(|e| {
        warn!(plugin = plugin_id, error = %e, "Using default settings");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{LevelController, SyncState};
    use crate::core::{LevelSettings, ProfileStore, DISABLED_PROFILE};
    use crate::grid::CanvasGeometry;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Save(Value),
        Post(Value),
    }

    /// Records calls in order; fails saves or commands on request
    #[derive(Default)]
    struct RecordingBackend {
        calls: RefCell<Vec<Call>>,
        fail_saves: bool,
        fail_commands: bool,
    }

    impl Backend for RecordingBackend {
        async fn load_settings(&self) -> Result<Value, LevelError> {
            Ok(json!({ "plugins": { "levelanything": LevelSettings::default() } }))
        }

        async fn save_settings(&self, patch: &SettingsPatch) -> Result<(), LevelError> {
            self.calls.borrow_mut().push(Call::Save(patch.to_request("levelanything")));
            if self.fail_saves {
                return Err(LevelError::Persistence("HTTP 500".into()));
            }
            Ok(())
        }

        async fn post_command(&self, command: &Command) -> Result<(), LevelError> {
            let body = serde_json::from_str(&command.to_json()).map_err(LevelError::from)?;
            self.calls.borrow_mut().push(Call::Post(body));
            if self.fail_commands {
                return Err(LevelError::Network("connection refused".into()));
            }
            Ok(())
        }
    }

    fn controller() -> RefCell<LevelController> {
        RefCell::new(LevelController::new(
            ProfileStore::default(),
            CanvasGeometry::default(),
        ))
    }

    #[tokio::test]
    async fn test_select_commits_before_notify() {
        let ctrl = controller();
        let backend = RecordingBackend::default();

        let effects = ctrl.borrow_mut().add_profile("A").unwrap();
        run_effects(&ctrl, &backend, effects).await;

        let calls = backend.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert!(matches!(&calls[0], Call::Save(body) if body["plugins"]["levelanything"]["profiles"].is_string()));
        assert_eq!(
            calls[1],
            Call::Save(json!({ "plugins": { "levelanything": { "selected_profile": "A" } } }))
        );
        assert_eq!(calls[2], Call::Post(json!({ "command": "profile_changed" })));
        assert_eq!(ctrl.borrow().store().selected_name(), "A");
    }

    #[tokio::test]
    async fn test_probe_start_posts_after_save() {
        let ctrl = controller();
        let backend = RecordingBackend::default();

        let effects = ctrl.borrow_mut().start_probe().unwrap();
        run_effects(&ctrl, &backend, effects).await;

        let calls = backend.calls.borrow();
        assert!(matches!(calls[0], Call::Save(_)));
        assert_eq!(calls[1], Call::Post(json!({ "command": "probe_start" })));
        assert!(ctrl.borrow().is_probing());
    }

    #[tokio::test]
    async fn test_failed_save_skips_notification() {
        let ctrl = controller();
        let backend = RecordingBackend {
            fail_saves: true,
            ..Default::default()
        };

        let effects = ctrl.borrow_mut().select_profile(DISABLED_PROFILE).unwrap();
        run_effects(&ctrl, &backend, effects).await;

        assert_eq!(backend.calls.borrow().len(), 1);
        let ctrl = ctrl.borrow();
        assert_eq!(ctrl.state(), SyncState::Idle);
        assert_eq!(
            ctrl.last_error(),
            Some(&LevelError::Persistence("HTTP 500".into()))
        );
    }

    #[tokio::test]
    async fn test_failed_probe_command_surfaces_error() {
        let ctrl = controller();
        let backend = RecordingBackend {
            fail_commands: true,
            ..Default::default()
        };

        let effects = ctrl.borrow_mut().start_probe().unwrap();
        run_effects(&ctrl, &backend, effects).await;

        let ctrl = ctrl.borrow();
        assert!(!ctrl.is_probing());
        assert!(matches!(ctrl.last_error(), Some(LevelError::Network(_))));
    }

    #[tokio::test]
    async fn test_loaded_settings_build_store() {
        let backend = RecordingBackend::default();
        let doc = backend.load_settings().await.unwrap();

        let settings: LevelSettings = settings_or_default(&doc, "levelanything");
        let store = settings.into_store().unwrap();
        assert!(store.is_disabled());

        let missing: LevelSettings = settings_or_default(&doc, "levelpcb");
        assert_eq!(missing, LevelSettings::default());
    }

    #[test]
    fn test_auth_message() {
        let session = LoginSession {
            name: "pi".into(),
            session: "abc123".into(),
        };
        let msg: Value = serde_json::from_str(&session.auth_message()).unwrap();
        assert_eq!(msg, json!({ "auth": "pi:abc123" }));
        assert_eq!(login_request(), json!({ "passive": true }));
    }
}
