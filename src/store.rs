//! Take storage: directory policy, delete, and rename.
//!
//! The recording session goes through the [`FileStore`] trait, so path and
//! naming policy stays out of the session core.

use std::fs;
use std::path::{Path, PathBuf};

/// Extension given to recorded takes (plain PCM WAV).
pub const TAKE_EXT: &str = "wav";

/// Errors produced by take storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("take not found: {0}")]
    NotFound(PathBuf),
    #[error("a take named '{0}' already exists")]
    AlreadyExists(String),
    #[error("invalid take name '{0}'")]
    InvalidName(String),
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage collaborator for finished takes.
pub trait FileStore {
    /// Directory new takes are recorded into.
    fn take_dir(&self) -> &Path;

    /// Deletes a finished take from disk.
    fn delete_take(&self, path: &Path) -> Result<(), StoreError>;

    /// Renames a finished take, keeping its extension. Returns the new path.
    /// Renaming to the current name is a no-op.
    fn rename_take(&self, path: &Path, new_name: &str) -> Result<PathBuf, StoreError>;
}

/// Filesystem-backed take store.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Opens (creating if needed) the takes directory.
    pub fn new(dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&dir)?;
        Ok(LocalStore { dir })
    }
}

impl FileStore for LocalStore {
    fn take_dir(&self) -> &Path {
        &self.dir
    }

    fn delete_take(&self, path: &Path) -> Result<(), StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        fs::remove_file(path)?;
        tracing::info!("Take deleted: {}", path.display());
        Ok(())
    }

    fn rename_take(&self, path: &Path, new_name: &str) -> Result<PathBuf, StoreError> {
        let name = new_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(StoreError::InvalidName(new_name.to_string()));
        }
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }

        let mut target = path.with_file_name(name);
        if let Some(ext) = path.extension() {
            target.set_extension(ext);
        }
        if target == path {
            return Ok(target);
        }
        if target.exists() {
            return Err(StoreError::AlreadyExists(name.to_string()));
        }

        fs::rename(path, &target)?;
        tracing::info!("Take renamed: {} -> {}", path.display(), target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_store(label: &str) -> (LocalStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("vrec_store_{}_{}", label, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let store = LocalStore::new(dir.clone()).unwrap();
        (store, dir)
    }

    fn touch(path: &Path) {
        fs::write(path, b"riff").unwrap();
    }

    #[test]
    fn test_delete_take() {
        let (store, dir) = scratch_store("delete");
        let take = dir.join("take_1.wav");
        touch(&take);
        store.delete_take(&take).unwrap();
        assert!(!take.exists());
        assert!(matches!(
            store.delete_take(&take),
            Err(StoreError::NotFound(_))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rename_keeps_extension() {
        let (store, dir) = scratch_store("rename");
        let take = dir.join("take_1.wav");
        touch(&take);
        let renamed = store.rename_take(&take, "standup notes").unwrap();
        assert_eq!(renamed, dir.join("standup notes.wav"));
        assert!(renamed.exists());
        assert!(!take.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rename_to_same_name_is_noop() {
        let (store, dir) = scratch_store("noop");
        let take = dir.join("take_1.wav");
        touch(&take);
        let renamed = store.rename_take(&take, "take_1").unwrap();
        assert_eq!(renamed, take);
        assert!(take.exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rename_rejects_bad_names_and_collisions() {
        let (store, dir) = scratch_store("reject");
        let take = dir.join("take_1.wav");
        let other = dir.join("take_2.wav");
        touch(&take);
        touch(&other);
        assert!(matches!(
            store.rename_take(&take, ""),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.rename_take(&take, "a/b"),
            Err(StoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.rename_take(&take, "take_2"),
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(take.exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
