use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::GameProfile;

pub const CONFIG_FILE_NAME: &str = "launcher.json";

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read launcher config: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("launcher config is corrupt: {path}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write launcher config: {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize launcher config")]
    Serialize(#[source] serde_json::Error),
}

/// The persisted launcher record.
///
/// Field names on disk are shared with every earlier launcher release, so
/// missing keys load as empty strings instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherConfig {
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub home_dir: String,
    #[serde(default)]
    pub game_token: String,
    #[serde(default)]
    pub q_connect_serv: String,
}

impl LauncherConfig {
    pub fn defaults_for(profile: &GameProfile) -> Self {
        Self {
            web_url: profile.default_web_url.to_string(),
            q_connect_serv: profile.default_quick_connect_server.to_string(),
            ..Self::default()
        }
    }

    pub fn has_token(&self) -> bool {
        !self.game_token.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record, writing the profile defaults first if no file exists yet.
    pub fn load(&self, profile: &GameProfile) -> ConfigResult<LauncherConfig> {
        let serialized = match fs::read_to_string(&self.path) {
            Ok(serialized) => serialized,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no launcher config; writing defaults");
                let config = LauncherConfig::defaults_for(profile);
                self.save(&config)?;
                return Ok(config);
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let config =
            serde_json::from_str(&serialized).map_err(|source| ConfigError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        tracing::debug!(path = %self.path.display(), "loaded launcher config");
        Ok(config)
    }

    pub fn save(&self, config: &LauncherConfig) -> ConfigResult<()> {
        let serialized = serde_json::to_string_pretty(config).map_err(ConfigError::Serialize)?;
        write_atomic(&self.path, &serialized).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "saved launcher config");
        Ok(())
    }
}

fn write_atomic(path: &Path, payload: &str) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp_path = match path.file_name() {
        Some(name) => path.with_file_name(format!("{}.tmp", name.to_string_lossy())),
        None => path.with_extension("tmp"),
    };

    fs::write(&temp_path, payload)?;
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    Ok(())
}
