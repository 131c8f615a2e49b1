//! Configuration loading and parsing

use anyhow::{Context, Result};
use dsky_protocol::{PeripheralRole, ProtocolConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration (loaded from dsky.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub peripherals: PeripheralsConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatorConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    19697
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl SimulatorConfig {
    /// `host:port` for the socket connection
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Device paths of the peripheral controllers
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeripheralsConfig {
    pub display: Option<PathBuf>,
    pub indicators: Option<PathBuf>,
    pub keyboard: Option<PathBuf>,
    /// Pause after every controller write, in milliseconds (0 disables it)
    #[serde(default = "default_write_pause")]
    pub write_pause_ms: u64,
}

fn default_write_pause() -> u64 {
    100
}

impl Default for PeripheralsConfig {
    fn default() -> Self {
        Self {
            display: None,
            indicators: None,
            keyboard: None,
            write_pause_ms: default_write_pause(),
        }
    }
}

impl PeripheralsConfig {
    pub fn path(&self, role: PeripheralRole) -> Option<&Path> {
        match role {
            PeripheralRole::Display => self.display.as_deref(),
            PeripheralRole::Indicators => self.indicators.as_deref(),
            PeripheralRole::Keyboard => self.keyboard.as_deref(),
        }
    }

    pub fn write_pause(&self) -> Duration {
        Duration::from_millis(self.write_pause_ms)
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    for role in [PeripheralRole::Display, PeripheralRole::Indicators, PeripheralRole::Keyboard] {
        if config.peripherals.path(role).is_none() {
            log::debug!("No {} controller configured", role);
        }
    }

    Ok(config)
}
