use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::{ConfigError, ConfigStore, LauncherConfig};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("destination already exists: {path}")]
    DestinationExists { path: PathBuf },
    #[error("{source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("moved data but could not save the launcher config: {0}")]
    Persist(#[from] ConfigError),
}

pub type MigrationResult<T> = std::result::Result<T, MigrationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationKind {
    UserData,
    CustomMaps,
}

impl MigrationKind {
    pub fn prompt(self) -> &'static str {
        match self {
            Self::UserData => "We've detected you're upgrading from an older version. Would you like to migrate your user data folder?",
            Self::CustomMaps => "We've detected you're upgrading from an older version. Would you like to migrate your custom map folder?",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Self::UserData => "Successfully migrated user folder!",
            Self::CustomMaps => "Successfully migrated custom map folder!",
        }
    }

    /// Whether a successful move relocates the configured home directory.
    fn moves_home_dir(self) -> bool {
        matches!(self, Self::UserData)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationCandidate {
    pub kind: MigrationKind,
    pub legacy: PathBuf,
    pub current: PathBuf,
}

impl MigrationCandidate {
    pub fn new(kind: MigrationKind, legacy: PathBuf, current: PathBuf) -> Self {
        Self {
            kind,
            legacy,
            current,
        }
    }
}

pub fn failure_message(err: &MigrationError) -> String {
    format!("Migration failed! Please report this in the Discord server.\n\nError details: {err}")
}

/// Moves legacy data directories into the current layout.
///
/// A legacy path is offered at most once per run. Nothing is remembered
/// across runs: a declined migration is offered again next launch.
#[derive(Debug, Default)]
pub struct MigrationManager {
    offered: HashSet<PathBuf>,
}

impl MigrationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the legacy directory exists and has not been offered yet.
    pub fn detect(&self, candidate: &MigrationCandidate) -> bool {
        !self.offered.contains(&candidate.legacy) && candidate.legacy.is_dir()
    }

    pub fn mark_offered(&mut self, candidate: &MigrationCandidate) {
        self.offered.insert(candidate.legacy.clone());
    }

    /// Moves the legacy directory and persists the config.
    ///
    /// A failed move or config save leaves the source directory and `config`
    /// as they were.
    pub fn migrate(
        &mut self,
        candidate: &MigrationCandidate,
        config: &mut LauncherConfig,
        store: &ConfigStore,
    ) -> MigrationResult<()> {
        self.mark_offered(candidate);

        if candidate.current.exists() {
            return Err(MigrationError::DestinationExists {
                path: candidate.current.clone(),
            });
        }

        fs::rename(&candidate.legacy, &candidate.current).map_err(|source| {
            tracing::warn!(
                from = %candidate.legacy.display(),
                to = %candidate.current.display(),
                ?source,
                "migration move failed"
            );
            MigrationError::Move {
                from: candidate.legacy.clone(),
                to: candidate.current.clone(),
                source,
            }
        })?;
        tracing::info!(
            kind = ?candidate.kind,
            to = %candidate.current.display(),
            "migrated legacy directory"
        );

        let previous_home = config.home_dir.clone();
        if candidate.kind.moves_home_dir() {
            config.home_dir = candidate.current.to_string_lossy().into_owned();
        }
        if let Err(err) = store.save(config) {
            config.home_dir = previous_home;
            roll_back(candidate);
            return Err(err.into());
        }
        Ok(())
    }
}

/// Moves `current` back to `legacy` after the config could not be saved.
fn roll_back(candidate: &MigrationCandidate) {
    match fs::rename(&candidate.current, &candidate.legacy) {
        Ok(()) => tracing::warn!(
            kind = ?candidate.kind,
            "config save failed; migration rolled back"
        ),
        Err(err) => tracing::error!(
            ?err,
            from = %candidate.current.display(),
            to = %candidate.legacy.display(),
            "config save failed and migration could not be rolled back"
        ),
    }
}
