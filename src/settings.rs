use std::{
    fs,
    path::{Path, PathBuf},
};

use bevy::prelude::*;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{
    camera::CameraConfig, error::ConfigError, projection::GeoProjection, route::RouteConfig,
    streaming::StreamingConfig,
};

pub const API_ENV_VAR: &str = "GEO_VIEWER_API";
const CONFIG_FILE: &str = "config.json";

pub struct SettingsPlugin;

impl Plugin for SettingsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ViewerConfig::load());
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Per-request timeout handed to the http agent.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8091".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub projection: GeoProjection,
    pub camera: CameraConfig,
    pub streaming: StreamingConfig,
    pub route: RouteConfig,
    pub provider: ProviderConfig,
}

impl ViewerConfig {
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "GeoViewer", "geo-viewer")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Reads the user's config file, falling back to defaults when it is
    /// missing or broken. Never fails.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => match Self::load_from(&path) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring {}: {e}", path.display());
                    Self::default()
                }
            },
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var(API_ENV_VAR) {
            if !url.is_empty() {
                config.provider.base_url = url;
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let raw = r#"{
            "camera": { "min_distance": 2.0 },
            "provider": { "base_url": "http://example" }
        }"#;
        let config: ViewerConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.camera.min_distance, 2.0);
        assert_eq!(config.camera.max_distance, CameraConfig::default().max_distance);
        assert_eq!(config.provider.base_url, "http://example");
        assert_eq!(config.provider.timeout_secs, 5);
        assert_eq!(config.route, RouteConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ViewerConfig::load_from(&path), Err(ConfigError::Decode(_))));
        assert!(matches!(
            ViewerConfig::load_from(&dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
