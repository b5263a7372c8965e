use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::game::GameProfile;

mod migration;

pub use migration::{
    failure_message, MigrationCandidate, MigrationError, MigrationKind, MigrationManager,
    MigrationResult,
};

const MY_GAMES_SUBDIR: &str = "My Games";
const PACKAGES_SUBDIR: &str = "packages";
const LEGACY_MAPS_SUBDIR: &str = "base";
const MAPS_SUBDIR: &str = "maps";
const DOCUMENTS_FALLBACK_SUBDIR: &str = "Documents";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not determine the user's documents directory")]
    MissingDocumentsDirectory,
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Where the game keeps per-user data, current and legacy layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDirectories {
    documents_dir: PathBuf,
    home_folder: String,
    legacy_home_folder: String,
}

impl GameDirectories {
    pub fn with_documents_dir(documents_dir: PathBuf, profile: &GameProfile) -> Self {
        Self {
            documents_dir,
            home_folder: profile.home_folder.to_string(),
            legacy_home_folder: profile.legacy_home_folder.to_string(),
        }
    }

    pub fn with_default_paths(profile: &GameProfile) -> StorageResult<Self> {
        let documents_dir = dirs::document_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(DOCUMENTS_FALLBACK_SUBDIR)))
            .ok_or(StorageError::MissingDocumentsDirectory)?;
        Ok(Self::with_documents_dir(documents_dir, profile))
    }

    pub fn documents_dir(&self) -> &Path {
        &self.documents_dir
    }

    fn my_games_dir(&self) -> PathBuf {
        self.documents_dir.join(MY_GAMES_SUBDIR)
    }

    /// Home directory used when the config leaves `homeDir` empty.
    pub fn default_home_dir(&self) -> PathBuf {
        self.my_games_dir().join(&self.home_folder)
    }

    pub fn legacy_home_dir(&self) -> PathBuf {
        self.my_games_dir().join(&self.legacy_home_folder)
    }

    pub fn legacy_maps_dir(&self) -> PathBuf {
        self.default_home_dir()
            .join(PACKAGES_SUBDIR)
            .join(LEGACY_MAPS_SUBDIR)
    }

    pub fn maps_dir(&self) -> PathBuf {
        self.default_home_dir().join(PACKAGES_SUBDIR).join(MAPS_SUBDIR)
    }

    /// Migrations in the order they must be evaluated: the maps candidate
    /// lives under the layout the user-data migration produces.
    pub fn migration_candidates(&self) -> [MigrationCandidate; 2] {
        [
            MigrationCandidate::new(
                MigrationKind::UserData,
                self.legacy_home_dir(),
                self.default_home_dir(),
            ),
            MigrationCandidate::new(
                MigrationKind::CustomMaps,
                self.legacy_maps_dir(),
                self.maps_dir(),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::CARMINE_IMPACT;

    #[test]
    fn layout_paths_follow_documents_root() {
        let dirs = GameDirectories::with_documents_dir(
            PathBuf::from("/home/p/Documents"),
            &CARMINE_IMPACT,
        );
        assert_eq!(
            dirs.default_home_dir(),
            PathBuf::from("/home/p/Documents/My Games/Carmine Impact Alpha")
        );
        assert_eq!(
            dirs.legacy_home_dir(),
            PathBuf::from("/home/p/Documents/My Games/Project Crimson Alpha")
        );
        assert_eq!(
            dirs.legacy_maps_dir(),
            PathBuf::from("/home/p/Documents/My Games/Carmine Impact Alpha/packages/base")
        );
        assert_eq!(
            dirs.maps_dir(),
            PathBuf::from("/home/p/Documents/My Games/Carmine Impact Alpha/packages/maps")
        );
    }

    #[test]
    fn migration_candidates_are_ordered_user_data_first() {
        let dirs = GameDirectories::with_documents_dir(PathBuf::from("/docs"), &CARMINE_IMPACT);
        let [first, second] = dirs.migration_candidates();
        assert_eq!(first.kind, MigrationKind::UserData);
        assert_eq!(second.kind, MigrationKind::CustomMaps);
        assert!(second.legacy.starts_with(&first.current));
    }
}
