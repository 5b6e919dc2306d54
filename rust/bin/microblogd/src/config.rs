//! Server configuration, read from a TOML file.
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8080"
//! api_prefix = "/api"
//! cors_origins = ["http://localhost"]
//!
//! [storage]
//! data_dir = "/var/lib/microblog"
//!
//! [media]
//! max_upload_bytes = 10485760
//!
//! [seed]
//! enabled = true
//! ```
//!
//! Every section and key is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Directory that bare context names resolve into.
const CONFIG_DIR: &str = "/etc/microblog";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: HttpSection,
    pub storage: StorageSection,
    pub media: MediaSection,
    pub seed: SeedSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub listen: String,

    /// Path every API route is nested under.
    pub api_prefix: String,

    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            api_prefix: "/api".to_string(),
            cors_origins: vec![
                "http://localhost".to_string(),
                "http://localhost:80".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Holds `data.sqlite` and the `media/` directory.
    pub data_dir: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaSection {
    pub max_upload_bytes: usize,

    /// Public path prefix of media downloads. Defaults to `{api_prefix}/medias`.
    pub public_prefix: Option<String>,
}

impl Default for MediaSection {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            public_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedSection {
    /// Insert the default accounts into an empty database.
    pub enabled: bool,
}

impl Default for SeedSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ServerConfig {
    /// Resolve a context name or path to a config file path.
    ///
    /// Anything containing `/` or `.` is taken as a path; a bare name maps
    /// to `/etc/microblog/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn media_public_prefix(&self) -> String {
        match &self.media.public_prefix {
            Some(prefix) => prefix.trim_end_matches('/').to_string(),
            None => format!("{}/medias", self.server.api_prefix.trim_end_matches('/')),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            ServerConfig::resolve_path("prod"),
            PathBuf::from("/etc/microblog/prod.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./dev.toml"),
            PathBuf::from("./dev.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("/tmp/x"),
            PathBuf::from("/tmp/x")
        );
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.server.api_prefix, "/api");
        assert_eq!(config.server.cors_origins.len(), 2);
        assert_eq!(config.storage.data_dir, "./data");
        assert_eq!(config.media.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.seed.enabled);
        assert_eq!(config.media_public_prefix(), "/api/medias");
    }

    #[test]
    fn test_partial_override() {
        let config = ServerConfig::parse(
            r#"
            [server]
            api_prefix = "/v1/"

            [storage]
            data_dir = "/var/lib/microblog"

            [seed]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(config.storage.data_dir, "/var/lib/microblog");
        assert!(!config.seed.enabled);
        assert_eq!(config.media_public_prefix(), "/v1/medias");
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.toml");
        std::fs::write(&path, "[media]\nmax_upload_bytes = 1024\n").unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.media.max_upload_bytes, 1024);

        assert!(ServerConfig::load(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_bad_toml() {
        assert!(ServerConfig::parse("[server\nlisten = 1").is_err());
    }
}
