use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where per-view preferences are stored. Defaults to
    /// `<data dir>/vista/preferences.json`.
    #[serde(default)]
    pub preference_path: Option<String>,
    /// Namespace prefix for persisted preference keys.
    #[serde(default)]
    pub namespace: Option<String>,
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir().map(|home| home.join(".config/vista/config.toml"))
        }
        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|config| config.join("vista/config.toml"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|config| config.join("vista\\config.toml"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    pub fn load() -> Self {
        if let Some(config_path) = Self::config_path() {
            if config_path.exists() {
                if let Ok(content) = std::fs::read_to_string(&config_path) {
                    if let Ok(config) = toml::from_str(&content) {
                        return config;
                    }
                }
            }
        }
        Self::default()
    }

    pub fn effective_namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or("vista.views")
    }

    pub fn effective_preference_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.preference_path {
            return Some(PathBuf::from(path));
        }
        dirs::data_dir().map(|data| data.join("vista/preferences.json"))
    }
}
