use axum::extract::State;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use microblog_core::ServiceError;

use crate::api::AppState;

/// Header carrying the caller's credential.
pub const API_KEY_HEADER: &str = "api-key";

const ACCESS_DENIED: &str = "Access is denied for unauthorized users";

/// API key authentication middleware.
///
/// Resolves the `api-key` header to a user and stores it as an extension
/// for handlers (`Extension<User>`). Raw media downloads are public.
pub async fn api_key_middleware(
    State(svc): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if is_public(req.method(), req.uri().path()) {
        return next.run(req).await;
    }

    let key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let Some(key) = key else {
        warn!(path = %req.uri().path(), "request without api-key");
        return ServiceError::Unauthorized(ACCESS_DENIED.to_string()).into_response();
    };

    match svc.find_user_by_api_key(&key) {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(None) => {
            warn!(path = %req.uri().path(), "unknown api-key");
            ServiceError::Unauthorized(ACCESS_DENIED.to_string()).into_response()
        }
        Err(e) => ServiceError::from(e).into_response(),
    }
}

/// `GET .../medias/{id}`, wherever the router is nested.
fn is_public(method: &Method, path: &str) -> bool {
    if method != Method::GET {
        return false;
    }
    let mut segments = path.trim_end_matches('/').rsplit('/');
    let id = segments.next().unwrap_or_default();
    let parent = segments.next().unwrap_or_default();
    parent == "medias" && !id.is_empty()
}
