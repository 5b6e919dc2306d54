use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::BlobError;
use crate::traits::BlobStore;

/// FileStore is a BlobStore implementation backed by the local filesystem.
///
/// Keys are mapped to paths under `base_dir`:
///   key "avatars/7.jpg" → `{base_dir}/avatars/7.jpg`
///
/// Parent directories are created automatically on `put`.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new FileStore rooted at `base_dir`.
    /// The directory is created if it doesn't exist.
    pub fn open(base_dir: &Path) -> Result<Self, BlobError> {
        fs::create_dir_all(base_dir).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Resolve a key to a filesystem path. Rejects keys that escape base_dir.
    fn resolve(&self, key: &str) -> Result<PathBuf, BlobError> {
        if key.is_empty() || key.starts_with('\\') {
            return Err(BlobError::InvalidKey(key.to_string()));
        }

        // Only plain names are allowed: no root, no `.`, no `..`.
        let relative = Path::new(key);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(BlobError::InvalidKey(key.to_string()));
        }

        Ok(self.base_dir.join(relative))
    }
}

impl BlobStore for FileStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BlobError::Io(e.to_string()))?;
        }
        fs::write(&path, data).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        let path = self.resolve(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        let data = fs::read(&path).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(Some(data))
    }

    fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| BlobError::Io(e.to_string()))?;
        }
        Ok(())
    }
}
