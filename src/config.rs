// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// This module handles loading and parsing configuration from config.toml.
// Provides sensible defaults if config file is missing or has errors.
//
// The [device] section is the selection policy: which accelerator and queue
// family the checks bind to. Defaults pick index 0 everywhere, without
// hardcoding that in the call sites.

use anyhow::{Context, Result};
use ash::vk;
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub window: WindowConfig,
    pub debug: DebugConfig,
}

/// Accelerator and queue selection policy
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Index into the driver's enumeration order. No capability filtering.
    pub adapter_index: usize,
    /// Queue family to take the single queue from.
    pub queue_family_index: u32,
    /// Requested instance API version: "1.0", "1.1", "1.2" or "1.3".
    pub api_version: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adapter_index: 0,
            queue_family_index: 0,
            api_version: "1.1".to_string(),
        }
    }
}

/// Window settings for the swapchain check
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "vk-smoke".to_string(),
            width: 800,
            height: 800,
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Enable Vulkan validation layers (debug builds only).
    pub validation_layers: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            validation_layers: true,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults if not found
    pub fn load() -> Self {
        Self::load_from_path("config.toml").unwrap_or_else(|e| {
            log::warn!("Failed to load config.toml: {}. Using defaults.", e);
            Config::default()
        })
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        log::info!("Loaded configuration from {:?}", path);
        log::debug!("Config: {:?}", config);

        Ok(config)
    }
}

impl DeviceConfig {
    /// Get the requested API version as a Vulkan version number
    pub fn vk_api_version(&self) -> u32 {
        match self.api_version.as_str() {
            "1.0" => vk::API_VERSION_1_0,
            "1.1" => vk::API_VERSION_1_1,
            "1.2" => vk::API_VERSION_1_2,
            "1.3" => vk::API_VERSION_1_3,
            _ => {
                log::warn!(
                    "Unknown api_version '{}', defaulting to 1.1",
                    self.api_version
                );
                vk::API_VERSION_1_1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_index_zero_everywhere() {
        let config = Config::default();
        assert_eq!(config.device.adapter_index, 0);
        assert_eq!(config.device.queue_family_index, 0);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 800);
        assert!(config.debug.validation_layers);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: Config = toml::from_str(
            r#"
            [device]
            adapter_index = 1

            [window]
            title = "bring-up"
            "#,
        )
        .unwrap();
        assert_eq!(config.device.adapter_index, 1);
        assert_eq!(config.device.queue_family_index, 0);
        assert_eq!(config.window.title, "bring-up");
        assert_eq!(config.window.height, 800);
    }

    #[test]
    fn api_version_strings_map_to_vk_versions() {
        let mut device = DeviceConfig::default();
        assert_eq!(device.vk_api_version(), vk::API_VERSION_1_1);
        device.api_version = "1.0".to_string();
        assert_eq!(device.vk_api_version(), vk::API_VERSION_1_0);
        device.api_version = "1.3".to_string();
        assert_eq!(device.vk_api_version(), vk::API_VERSION_1_3);
        device.api_version = "2.0".to_string();
        assert_eq!(device.vk_api_version(), vk::API_VERSION_1_1);
    }
}
