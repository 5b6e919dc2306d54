pub mod schema;
pub mod user;
pub mod relation;
pub mod follow;
pub mod like;
pub mod ownership;
pub mod tweet;
pub mod media;
pub mod seed;

use std::sync::Arc;

use thiserror::Error;

use microblog_blob::BlobStore;
use microblog_sql::{SQLError, SQLStore};

pub use ownership::{Owned, Ownership};
pub use relation::{Direction, Relation, Toggle};

/// Social service error type.
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidOperation(String),

    #[error("{0}")]
    Validation(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<SocialError> for microblog_core::ServiceError {
    fn from(e: SocialError) -> Self {
        match e {
            SocialError::NotFound(m) => microblog_core::ServiceError::NotFound(m),
            SocialError::InvalidOperation(m) => microblog_core::ServiceError::InvalidOperation(m),
            SocialError::Validation(m) => microblog_core::ServiceError::Validation(m),
            SocialError::Storage(m) => microblog_core::ServiceError::Storage(m),
            SocialError::Internal(m) => microblog_core::ServiceError::Internal(m),
        }
    }
}

/// Wrap any storage-layer failure.
pub(crate) fn storage(e: SQLError) -> SocialError {
    SocialError::Storage(e.to_string())
}

/// Configuration for the social service.
#[derive(Debug, Clone)]
pub struct SocialConfig {
    /// Public path prefix media files are served under; a media's path
    /// is `{prefix}/{id}`.
    pub media_public_prefix: String,

    /// Largest accepted upload body in bytes.
    pub max_upload_bytes: usize,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            media_public_prefix: "/api/medias".to_string(),
            max_upload_bytes: 10 * 1024 * 1024, // 10 MiB
        }
    }
}

/// The social service. Holds storage backends and configuration.
pub struct SocialService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) blob: Arc<dyn BlobStore>,
    pub(crate) config: SocialConfig,
}

impl SocialService {
    /// Create a new SocialService, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        blob: Arc<dyn BlobStore>,
        config: SocialConfig,
    ) -> Result<Arc<Self>, SocialError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql, blob, config }))
    }

    pub fn config(&self) -> &SocialConfig {
        &self.config
    }
}
