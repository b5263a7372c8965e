use std::path::{Path, PathBuf};

use serde::Deserialize;

mod store;

pub use store::{ConfigError, ConfigResult, ConfigStore, LauncherConfig, CONFIG_FILE_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "gamegate";
const SETTINGS_FILE: &str = "settings.json";

/// Developer/user overrides from `settings.json`.
///
/// Every field is optional; an absent field means the built-in game profile
/// value or platform default applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherSettings {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub trusted_url: Option<String>,
    #[serde(default)]
    pub install_dir: Option<PathBuf>,
    #[serde(default)]
    pub documents_dir: Option<PathBuf>,
}

pub fn load_launcher_settings() -> LauncherSettings {
    let (xdg_config_home, home) = config_env_dirs();
    load_launcher_settings_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_launcher_settings_with(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> LauncherSettings {
    let path = match app_config_path(APP_DIR, SETTINGS_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return LauncherSettings::default(),
    };
    if !path.exists() {
        return LauncherSettings::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse settings.json; using defaults");
            LauncherSettings::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read settings.json; using defaults");
            LauncherSettings::default()
        }
    }
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
