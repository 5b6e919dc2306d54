mod users;
mod tweets;
mod medias;
mod middleware;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Router;
use serde::Serialize;

use microblog_core::ServiceError;

use crate::service::SocialService;

pub use middleware::API_KEY_HEADER;

/// Shared application state.
pub type AppState = Arc<SocialService>;

/// Body of every successful mutation that returns nothing else.
#[derive(Debug, Serialize)]
pub(crate) struct Ack {
    pub result: bool,
}

impl Ack {
    pub(crate) fn ok() -> Self {
        Self { result: true }
    }
}

/// Build the social API router.
///
/// All routes are relative; the caller nests them under the API prefix.
pub fn build_router(svc: Arc<SocialService>) -> Router {
    let max_upload = svc.config().max_upload_bytes;
    let api = Router::new()
        .merge(users::routes())
        .merge(tweets::routes())
        .merge(medias::routes(max_upload));

    api.layer(axum::middleware::from_fn_with_state(
        svc.clone(),
        middleware::api_key_middleware,
    ))
    .with_state(svc)
}

/// Unwrap a path id, turning a malformed one into a 400 with our body shape.
pub(crate) fn path_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, ServiceError> {
    id.map(|Path(id)| id)
        .map_err(|e| ServiceError::Validation(e.body_text()))
}

/// Same for JSON bodies.
pub(crate) fn json_body<T>(
    body: Result<axum::Json<T>, JsonRejection>,
) -> Result<T, ServiceError> {
    body.map(|axum::Json(v)| v)
        .map_err(|e| ServiceError::Validation(e.body_text()))
}
