//! Runtime configuration
//!
//! The CLI reads environment variables, the browser build reads globals the
//! host page may set on `window`. Unset values fall back to defaults.

use tracing::info;

use crate::core::LevelError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const ENV_BASE_URL: &str = "OCTOPRINT_URL";
pub const ENV_API_KEY: &str = "OCTOPRINT_API_KEY";
pub const ENV_PLUGIN: &str = "LEVEL_PLUGIN";

/// Path of the raw push socket on the host
pub const SOCKET_PATH: &str = "/sockjs/websocket";

/// Which leveling plugin the dashboard drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PluginKind {
    /// Named profiles with persisted matrices
    #[default]
    LevelAnything,
    /// One flat grid defined by four settings
    LevelPcb,
}

impl PluginKind {
    pub fn id(self) -> &'static str {
        match self {
            PluginKind::LevelAnything => "levelanything",
            PluginKind::LevelPcb => "levelpcb",
        }
    }

    pub fn from_id(id: &str) -> Result<Self, LevelError> {
        match id.trim() {
            "levelanything" => Ok(PluginKind::LevelAnything),
            "levelpcb" => Ok(PluginKind::LevelPcb),
            other => Err(LevelError::InvalidField {
                field: "plugin",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Host root, e.g. `http://octopi.local`
    pub base_url: String,
    pub api_key: Option<String>,
    pub plugin: PluginKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            plugin: PluginKind::default(),
        }
    }
}

impl Config {
    /// Build from a key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LevelError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let plugin = match get(ENV_PLUGIN) {
            Some(id) => PluginKind::from_id(&id)?,
            None => PluginKind::default(),
        };
        let config = Self {
            base_url: get(ENV_BASE_URL)
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: get(ENV_API_KEY),
            plugin,
        };
        info!(base_url = %config.base_url, plugin = config.plugin.id(), api_key = config.api_key.is_some(), "Configuration loaded");
        Ok(config)
    }

    pub fn from_env() -> Result<Self, LevelError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Browser configuration from `window.__level_base_url` / `window.__level_plugin`,
    /// defaulting to the page origin
    #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
    pub fn from_window() -> Result<Self, LevelError> {
        let global = |name: &str| {
            js_sys::eval(&format!("window.{}", name))
                .ok()
                .and_then(|v| v.as_string())
        };
        let origin = web_sys::window().and_then(|w| w.location().origin().ok());
        Self::from_lookup(|key| match key {
            ENV_BASE_URL => global("__level_base_url").or_else(|| origin.clone()),
            ENV_API_KEY => global("__level_api_key"),
            ENV_PLUGIN => global("__level_plugin"),
            _ => None,
        })
    }

    /// `ws(s)://` URL of the push socket
    pub fn socket_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            format!("ws://{}", base)
        };
        format!("{}{}", ws_base, SOCKET_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.socket_url(), "ws://127.0.0.1:5000/sockjs/websocket");
    }

    #[test]
    fn test_values_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://octopi.local/"),
            (ENV_API_KEY, "secret"),
            (ENV_PLUGIN, "levelpcb"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://octopi.local");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.plugin, PluginKind::LevelPcb);
        assert_eq!(config.socket_url(), "wss://octopi.local/sockjs/websocket");
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = Config::from_lookup(lookup(&[(ENV_API_KEY, "  ")])).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_unknown_plugin_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup(&[(ENV_PLUGIN, "bedlevel")])),
            Err(LevelError::InvalidField { field: "plugin", .. })
        ));
    }
}
