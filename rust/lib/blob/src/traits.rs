use crate::error::BlobError;

/// BlobStore provides storage for uploaded media files.
///
/// Keys are flat or path-like strings: `3f2a...c1.png`, `avatars/7.jpg`.
/// The default implementation (`FileStore`) maps keys to local filesystem paths.
pub trait BlobStore: Send + Sync {
    /// Store a blob. Overwrites if the key already exists.
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError>;

    /// Retrieve a blob. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError>;

    /// Delete a blob. No-op if the key does not exist.
    fn delete(&self, key: &str) -> Result<(), BlobError>;
}
