use std::path::PathBuf;

/// Storage layout shared by the server binary and its modules.
///
/// Every path falls back to a fixed name under `data_dir` when it is not
/// set explicitly.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Root directory for all persistent data.
    pub data_dir: Option<PathBuf>,

    /// Path to the SQLite database file.
    /// Defaults to `{data_dir}/data.sqlite` if not specified.
    pub sqlite_path: Option<PathBuf>,

    /// Directory for uploaded media files.
    /// Defaults to `{data_dir}/media/` if not specified.
    pub media_dir: Option<PathBuf>,
}

impl ServiceConfig {
    /// Resolve the SQLite database path, falling back to `{data_dir}/data.sqlite`.
    pub fn resolve_sqlite_path(&self) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("data.sqlite"))
    }

    /// Resolve the media storage directory.
    pub fn resolve_media_dir(&self) -> PathBuf {
        self.media_dir
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("media"))
    }

    fn resolve_data_subpath(&self, name: &str) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(|d| d.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}
