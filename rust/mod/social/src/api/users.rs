use axum::extract::rejection::PathRejection;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use microblog_core::ServiceError;

use crate::api::{path_id, Ack, AppState};
use crate::model::{User, UserProfile};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(me))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/follow", post(follow).delete(unfollow))
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
    result: bool,
    user: UserProfile,
}

fn user_not_found(id: i64) -> ServiceError {
    ServiceError::NotFound(format!("Пользователь с id# {} не найден", id))
}

fn profile(svc: &AppState, id: i64) -> Result<Json<ProfileResponse>, ServiceError> {
    let user = svc.get_user_profile(id)?.ok_or_else(|| user_not_found(id))?;
    Ok(Json(ProfileResponse { result: true, user }))
}

/// GET /users/me
async fn me(
    State(svc): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<ProfileResponse>, ServiceError> {
    profile(&svc, user.id)
}

/// GET /users/{id}
async fn get_user(
    State(svc): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProfileResponse>, ServiceError> {
    profile(&svc, path_id(id)?)
}

/// POST /users/{id}/follow
async fn follow(
    State(svc): State<AppState>,
    Extension(user): Extension<User>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<(StatusCode, Json<Ack>), ServiceError> {
    svc.follow_user(&user, path_id(id)?)?;
    Ok((StatusCode::CREATED, Json(Ack::ok())))
}

/// DELETE /users/{id}/follow
async fn unfollow(
    State(svc): State<AppState>,
    Extension(user): Extension<User>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Ack>, ServiceError> {
    svc.unfollow_user(&user, path_id(id)?)?;
    Ok(Json(Ack::ok()))
}
