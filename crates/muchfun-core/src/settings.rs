//! User settings management
//!
//! Settings are stored as JSON in the user config directory. A missing or
//! unreadable file is not an error: the application starts with defaults.

use crate::error::{CoreError, Result};
use crate::logging::LogConfig;
use crate::mixer::MixerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default Buttplug server address (Intiface Central)
pub const DEFAULT_SERVER_ADDRESS: &str = "ws://127.0.0.1:12345";

/// Name announced to the server during the handshake
pub const DEFAULT_CLIENT_NAME: &str = "MuchFun Controller";

/// True for `ws://` and `wss://` addresses with something after the scheme
pub fn is_websocket_url(address: &str) -> bool {
    address
        .strip_prefix("ws://")
        .or_else(|| address.strip_prefix("wss://"))
        .is_some_and(|rest| !rest.is_empty())
}

/// Persistent application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Websocket address of the Buttplug server
    pub server_address: String,
    pub client_name: String,
    /// Connect on startup
    pub auto_connect: bool,
    /// Start with DEBUG logging
    pub verbose_logging: bool,
    pub mixer: MixerConfig,
    pub log: LogConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            auto_connect: false,
            verbose_logging: false,
            mixer: MixerConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Settings {
    /// `<config dir>/MuchFun/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("MuchFun");
            p.push("settings.json");
            p
        })
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_or_default(&path),
            None => {
                warn!("No config directory available, using default settings");
                Self::default()
            }
        }
    }

    /// Load from `path`, logging and falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(settings) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                warn!("Failed to load settings from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()
            .ok_or_else(|| CoreError::Config("No config directory available".to_string()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !is_websocket_url(&self.server_address) {
            return Err(CoreError::Config(format!(
                "Server address must be a websocket URL: {}",
                self.server_address
            )));
        }
        if !self.mixer.output_rate_hz.is_finite() || self.mixer.output_rate_hz <= 0.0 {
            return Err(CoreError::Config(format!(
                "Output rate must be positive: {}",
                self.mixer.output_rate_hz
            )));
        }
        Ok(())
    }
}
