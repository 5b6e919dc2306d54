use axum::extract::rejection::PathRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::debug;

use microblog_core::ServiceError;

use crate::api::{path_id, AppState};
use crate::model::Media;

/// Multipart field holding the uploaded file.
const FILE_FIELD: &str = "file";

pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/medias",
            post(upload)
                .layer(DefaultBodyLimit::max(max_upload_bytes))
                .get(list_medias),
        )
        .route("/medias/{id}", get(download))
}

#[derive(Debug, Serialize)]
struct MediaCreated {
    result: bool,
    media_id: i64,
}

#[derive(Debug, Serialize)]
struct MediaList {
    result: bool,
    medias: Vec<Media>,
}

fn bad_upload(e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Validation(e.to_string())
}

/// POST /medias (multipart, field `file`)
async fn upload(
    State(svc): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MediaCreated>), ServiceError> {
    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        if field.name() != Some(FILE_FIELD) {
            debug!(name = ?field.name(), "skipping multipart field");
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(bad_upload)?;

        let media = svc.create_media(&file_name, content_type.as_deref(), &data)?;
        return Ok((
            StatusCode::CREATED,
            Json(MediaCreated {
                result: true,
                media_id: media.id,
            }),
        ));
    }

    Err(ServiceError::Validation("Файл не передан".to_string()))
}

/// GET /medias
async fn list_medias(State(svc): State<AppState>) -> Result<Json<MediaList>, ServiceError> {
    let medias = svc.list_medias()?;
    Ok(Json(MediaList {
        result: true,
        medias,
    }))
}

/// GET /medias/{id}: raw bytes, no api key required.
async fn download(
    State(svc): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ServiceError> {
    let id = path_id(id)?;
    let (media, data) = svc
        .read_media(id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Медиа с id# {} не найден", id)))?;
    Ok(([(header::CONTENT_TYPE, media.content_type)], data).into_response())
}
