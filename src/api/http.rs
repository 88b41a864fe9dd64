//! Native HTTP client for the OctoPrint REST API

use serde_json::Value;
use tracing::{debug, info};

use super::{login_request, Backend, LoginSession};
use crate::config::Config;
use crate::core::{Command, LevelError, SettingsPatch};

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Clone)]
pub struct OctoPrintClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    plugin_id: String,
}

impl OctoPrintClient {
    pub fn new(config: &Config) -> Result<Self, LevelError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("level-vis/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(network)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            plugin_id: config.plugin.id().to_string(),
        })
    }

    /// Passive login; the session authenticates the push socket
    pub async fn login(&self) -> Result<LoginSession, LevelError> {
        let resp = self
            .request(reqwest::Method::POST, "/api/login")
            .json(&login_request())
            .send()
            .await
            .map_err(network)?;
        if !resp.status().is_success() {
            return Err(LevelError::Network(format!("login failed: HTTP {}", resp.status())));
        }
        let session: LoginSession = resp.json().await.map_err(|e| LevelError::Decode(e.to_string()))?;
        info!(user = %session.name, "Logged in");
        Ok(session)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        req
    }
}

impl Backend for OctoPrintClient {
    async fn load_settings(&self) -> Result<Value, LevelError> {
        let resp = self
            .request(reqwest::Method::GET, "/api/settings")
            .send()
            .await
            .map_err(network)?;
        if !resp.status().is_success() {
            return Err(LevelError::Network(format!("settings load: HTTP {}", resp.status())));
        }
        resp.json().await.map_err(|e| LevelError::Decode(e.to_string()))
    }

    async fn save_settings(&self, patch: &SettingsPatch) -> Result<(), LevelError> {
        let body = patch.to_request(&self.plugin_id);
        let resp = self
            .request(reqwest::Method::POST, "/api/settings")
            .json(&body)
            .send()
            .await
            .map_err(|e| LevelError::Persistence(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(LevelError::Persistence(format!("HTTP {}", resp.status())));
        }
        debug!(plugin = %self.plugin_id, "Settings persisted");
        Ok(())
    }

    async fn post_command(&self, command: &Command) -> Result<(), LevelError> {
        let path = format!("/api/plugin/{}", self.plugin_id);
        let resp = self
            .request(reqwest::Method::POST, &path)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(command.to_json())
            .send()
            .await
            .map_err(network)?;
        if !resp.status().is_success() {
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

fn network(e: reqwest::Error) -> LevelError {
    LevelError::Network(e.to_string())
}
