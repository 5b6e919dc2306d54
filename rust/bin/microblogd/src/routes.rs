//! Route registration: the social module under the API prefix, plus
//! system endpoints.

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use social::api::API_KEY_HEADER;

use crate::config::ServerConfig;

/// Build the complete router with all routes.
pub fn build_router(config: &ServerConfig, module_routes: Router) -> Router {
    let system_routes = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    let prefix = config.server.api_prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        system_routes.merge(module_routes)
    } else {
        system_routes.nest(prefix, module_routes)
    };

    app.layer(cors_layer(&config.server.cors_origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
        .allow_credentials(true)
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "microblogd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
