//! Bootstrap: configuration checks, store setup and first-start seeding.

use std::path::PathBuf;
use std::sync::Arc;

use microblog_core::ServiceConfig;
use social::service::SocialConfig;
use social::SocialModule;
use tracing::info;

use crate::config::ServerConfig;

/// Refuse to start on a configuration that cannot work.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.trim().is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    let prefix = &config.server.api_prefix;
    if !prefix.is_empty() && !prefix.starts_with('/') {
        anyhow::bail!("server.api_prefix must start with '/': {:?}", prefix);
    }
    if prefix.contains(['{', '}', '*']) {
        anyhow::bail!("server.api_prefix must be a literal path: {:?}", prefix);
    }
    if config.media.max_upload_bytes == 0 {
        anyhow::bail!("media.max_upload_bytes must be greater than zero.");
    }
    Ok(())
}

/// Open the stores under `data_dir` and build the social module.
pub fn open_module(config: &ServerConfig) -> anyhow::Result<SocialModule> {
    let data_dir = PathBuf::from(&config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = ServiceConfig {
        data_dir: Some(data_dir),
        ..Default::default()
    };

    let sqlite_path = core_config.resolve_sqlite_path();
    let sql: Arc<dyn microblog_sql::SQLStore> = Arc::new(
        microblog_sql::SqliteStore::open(&sqlite_path)
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );
    let blob: Arc<dyn microblog_blob::BlobStore> = Arc::new(
        microblog_blob::FileStore::open(&core_config.resolve_media_dir())
            .map_err(|e| anyhow::anyhow!("failed to open media store: {}", e))?,
    );
    info!("Database at {}", sqlite_path.display());

    let social_config = SocialConfig {
        media_public_prefix: config.media_public_prefix(),
        max_upload_bytes: config.media.max_upload_bytes,
    };
    let module = SocialModule::new(sql, blob, social_config)?;

    if config.seed.enabled && module.service().seed_defaults()? {
        info!("Seeded default users (admin, sf)");
    }

    Ok(module)
}
