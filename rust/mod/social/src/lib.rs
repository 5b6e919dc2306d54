//! Social module: users, tweets, media, follows and likes.
//!
//! # Resources
//!
//! - **User**: display name plus an opaque api key
//! - **Tweet**: text owned by its author, with ordered media attachments
//! - **Media**: uploaded file, served back by id
//! - **Follow** / **Like**: edges between users, and between users and tweets
//!
//! # Usage
//!
//! ```ignore
//! use social::{SocialModule, service::SocialConfig};
//!
//! let module = SocialModule::new(sql, blob, SocialConfig::default())?;
//! let router = module.routes(); // Mount under /api
//! ```

pub mod model;
pub mod service;
pub mod api;

use std::sync::Arc;

use axum::Router;

use microblog_blob::BlobStore;
use microblog_core::{Module, ServiceError};
use microblog_sql::SQLStore;

use crate::service::{SocialConfig, SocialService};

/// Social module implementing the Module trait.
pub struct SocialModule {
    service: Arc<SocialService>,
}

impl SocialModule {
    pub fn new(
        sql: Arc<dyn SQLStore>,
        blob: Arc<dyn BlobStore>,
        config: SocialConfig,
    ) -> Result<Self, ServiceError> {
        let service = SocialService::new(sql, blob, config).map_err(ServiceError::from)?;
        Ok(Self { service })
    }

    /// Get a reference to the underlying SocialService.
    pub fn service(&self) -> &Arc<SocialService> {
        &self.service
    }
}

impl Module for SocialModule {
    fn name(&self) -> &str {
        "social"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
