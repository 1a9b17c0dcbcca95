use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathError {
    MissingHomeDirectory,
}

pub(crate) const APP_DIR: &str = "action-history";
const APP_CONFIG_FILE: &str = "config.json";

pub const DEFAULT_ACTION_HISTORY_SIZE: usize = 100;
pub const MAX_ACTION_HISTORY_SIZE: usize = 1000;

/// Settings read from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppConfig {
    /// Number of ranked actions kept. 0 disables the history.
    #[serde(default = "default_action_history_size")]
    pub action_history_size: usize,
    /// Include actions that cannot currently be activated in search results.
    #[serde(default)]
    pub search_show_unavailable_actions: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            action_history_size: DEFAULT_ACTION_HISTORY_SIZE,
            search_show_unavailable_actions: false,
        }
    }
}

impl AppConfig {
    pub fn normalized(mut self) -> Self {
        self.action_history_size = clamp_history_size(self.action_history_size);
        self
    }
}

const fn default_action_history_size() -> usize {
    DEFAULT_ACTION_HISTORY_SIZE
}

pub fn clamp_history_size(size: usize) -> usize {
    size.min(MAX_ACTION_HISTORY_SIZE)
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    let config = match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    };
    config.normalized()
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
