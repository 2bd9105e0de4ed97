use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ChatError, Result};

pub const DEVELOPMENT_ENDPOINT: &str = "http://localhost:8000/api/chat/stream";
pub const PRODUCTION_ENDPOINT: &str =
    "https://coryfitzpatrick-ai-backend-fcwbtvbnfa-uc.a.run.app/api/chat/stream";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub endpoints: Endpoints,
    pub voice: VoiceSettings,
}

/// Chat endpoints, picked by the hostname the client is served from
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub development: String,
    pub production: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            development: DEVELOPMENT_ENDPOINT.to_string(),
            production: PRODUCTION_ENDPOINT.to_string(),
        }
    }
}

impl Endpoints {
    /// Development endpoint for loopback hostnames, production otherwise
    pub fn select(&self, hostname: &str) -> &str {
        if is_loopback(hostname) {
            &self.development
        } else {
            &self.production
        }
    }
}

fn is_loopback(hostname: &str) -> bool {
    let host = hostname.trim().trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.parse::<IpAddr>().map(|ip| ip.is_loopback()).unwrap_or(false)
}

/// Tuning for speech synthesis and recognition
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VoiceSettings {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub locale: String,
    /// Pause between showing a transcript and submitting it
    pub auto_submit_delay_ms: u64,
    /// Voice name tried before the ranked voice policy
    pub preferred_voice: Option<String>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 0.95,
            volume: 1.0,
            locale: "en-US".to_string(),
            auto_submit_delay_ms: 500,
            preferred_voice: None,
        }
    }
}

impl VoiceSettings {
    pub fn auto_submit_delay(&self) -> Duration {
        Duration::from_millis(self.auto_submit_delay_ms)
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load from `path`, using defaults when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ChatError::Config("could not determine config directory".into()))?;

        Ok(config_dir.join("folio").join("config.json"))
    }
}
