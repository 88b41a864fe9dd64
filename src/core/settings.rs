//! Persisted plugin settings and the patches written back through the settings API

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::LevelError;
use super::store::{ProfileStore, DISABLED_PROFILE};

/// Settings of the profile-based plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
    /// JSON-encoded profile mapping
    pub profiles: String,
    pub selected_profile: String,
    /// Server-side wait for a probe response, seconds
    pub response_timeout: f64,
    pub debug: bool,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            profiles: ProfileStore::default()
                .to_settings_json()
                .unwrap_or_else(|_| "{}".to_string()),
            selected_profile: DISABLED_PROFILE.to_string(),
            response_timeout: 60.0,
            debug: false,
        }
    }
}

impl LevelSettings {
    pub fn into_store(self) -> Result<ProfileStore, LevelError> {
        ProfileStore::from_settings(&self.profiles, &self.selected_profile)
    }
}

/// Settings of the flat single-grid plugin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PcbSettings {
    pub probe_width: f64,
    pub probe_height: f64,
    pub points_x: u32,
    pub points_y: u32,
}

impl Default for PcbSettings {
    fn default() -> Self {
        Self {
            probe_width: 100.0,
            probe_height: 100.0,
            points_x: 5,
            points_y: 5,
        }
    }
}

/// A partial settings update for one plugin
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsPatch {
    Profiles(String),
    SelectedProfile(String),
    Pcb(PcbSettings),
}

impl SettingsPatch {
    /// Plugin-scoped body for the settings endpoint
    pub fn to_request(&self, plugin_id: &str) -> Value {
        let inner = match self {
            SettingsPatch::Profiles(profiles) => json!({ "profiles": profiles }),
            SettingsPatch::SelectedProfile(name) => json!({ "selected_profile": name }),
            SettingsPatch::Pcb(pcb) => serde_json::to_value(pcb).unwrap_or(Value::Null),
        };
        json!({ "plugins": { plugin_id: inner } })
    }
}

/// Extract one plugin's section from a full settings document
pub fn plugin_section<T: for<'de> Deserialize<'de>>(
    settings: &Value,
    plugin_id: &str,
) -> Result<T, LevelError> {
    let section = settings
        .get("plugins")
        .and_then(|p| p.get(plugin_id))
        .cloned()
        .ok_or_else(|| LevelError::Decode(format!("settings lack plugins.{}", plugin_id)))?;
    Ok(serde_json::from_value(section)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_profile_patch_shape() {
        let body = SettingsPatch::SelectedProfile("A".into()).to_request("levelanything");
        assert_eq!(
            body,
            json!({"plugins": {"levelanything": {"selected_profile": "A"}}})
        );
    }

    #[test]
    fn test_pcb_patch_uses_camel_case() {
        let body = SettingsPatch::Pcb(PcbSettings::default()).to_request("levelpcb");
        assert_eq!(
            body,
            json!({"plugins": {"levelpcb": {
                "probeWidth": 100.0, "probeHeight": 100.0, "pointsX": 5, "pointsY": 5
            }}})
        );
    }

    #[test]
    fn test_default_settings_load_disabled_store() {
        let store = LevelSettings::default().into_store().unwrap();
        assert_eq!(store.selected_name(), DISABLED_PROFILE);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_plugin_section_extracts_settings() {
        let doc = json!({
            "api": {"enabled": true},
            "plugins": {
                "levelanything": {
                    "profiles": "{\"disabled\": {}, \"A\": {\"max_x\": 150}}",
                    "selected_profile": "A",
                    "debug": true
                }
            }
        });
        let settings: LevelSettings = plugin_section(&doc, "levelanything").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.response_timeout, 60.0);

        let store = settings.into_store().unwrap();
        assert_eq!(store.selected().max_x, 150.0);
    }

    #[test]
    fn test_missing_plugin_section_is_decode_error() {
        let doc = json!({"plugins": {}});
        let res: Result<PcbSettings, _> = plugin_section(&doc, "levelpcb");
        assert!(matches!(res, Err(LevelError::Decode(_))));
    }
}
