//! Browser HTTP client; relies on the host page's session cookie

use gloo_net::http::{Request, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use super::{login_request, Backend, LoginSession};
use crate::config::Config;
use crate::core::{Command, LevelError, SettingsPatch};

#[derive(Clone)]
pub struct BrowserClient {
    base_url: String,
    api_key: Option<String>,
    plugin_id: String,
}

impl BrowserClient {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            plugin_id: config.plugin.id().to_string(),
        }
    }

    pub async fn login(&self) -> Result<LoginSession, LevelError> {
        let resp = self
            .with_key(Request::post(&self.url("/api/login")))
            .json(&login_request())
            .map_err(network)?
            .send()
            .await
            .map_err(network)?;
        if !resp.ok() {
            return Err(LevelError::Network(format!("login failed: HTTP {}", resp.status())));
        }
        resp.json().await.map_err(|e| LevelError::Decode(e.to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_key(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("X-Api-Key", key),
            None => req,
        }
    }
}

impl Backend for BrowserClient {
    async fn load_settings(&self) -> Result<Value, LevelError> {
        let resp = self
            .with_key(Request::get(&self.url("/api/settings")))
            .send()
            .await
            .map_err(network)?;
        if !resp.ok() {
            return Err(LevelError::Network(format!("settings load: HTTP {}", resp.status())));
        }
        resp.json().await.map_err(|e| LevelError::Decode(e.to_string()))
    }

    async fn save_settings(&self, patch: &SettingsPatch) -> Result<(), LevelError> {
        let resp = self
            .with_key(Request::post(&self.url("/api/settings")))
            .json(&patch.to_request(&self.plugin_id))
            .map_err(|e| LevelError::Persistence(e.to_string()))?
            .send()
            .await
            .map_err(|e| LevelError::Persistence(e.to_string()))?;
        if !resp.ok() {
            return Err(LevelError::Persistence(format!("HTTP {}", resp.status())));
        }
        Ok(())
    }

    async fn post_command(&self, command: &Command) -> Result<(), LevelError> {
        let resp = self
            .with_key(Request::post(&self.url(&format!("/api/plugin/{}", self.plugin_id))))
            .header("Content-Type", "application/json")
            .body(command.to_json())
            .map_err(network)?
            .send()
            .await
            .map_err(network)?;
        if !resp.ok() {
            return Err(LevelError::Network(format!(
                "{} rejected: HTTP {}",
                command.name(),
                resp.status()
            )));
        }
        debug!(command = command.name(), "Command posted");
        Ok(())
    }
}

fn network(e: gloo_net::Error) -> LevelError {
    LevelError::Network(e.to_string())
}
