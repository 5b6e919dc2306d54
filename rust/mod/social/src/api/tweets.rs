use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;

use microblog_core::ServiceError;

use crate::api::{json_body, path_id, Ack, AppState};
use crate::model::{CreateTweet, Tweet, User};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tweets", get(list_tweets).post(create_tweet))
        .route("/tweets/{id}", delete(delete_tweet))
        .route("/tweets/{id}/likes", post(like).delete(unlike))
}

#[derive(Debug, Serialize)]
struct TweetList {
    result: bool,
    tweets: Vec<Tweet>,
}

#[derive(Debug, Serialize)]
struct TweetCreated {
    result: bool,
    tweet_id: i64,
}

/// GET /tweets
async fn list_tweets(State(svc): State<AppState>) -> Result<Json<TweetList>, ServiceError> {
    let tweets = svc.list_tweets()?;
    Ok(Json(TweetList {
        result: true,
        tweets,
    }))
}

/// POST /tweets
async fn create_tweet(
    State(svc): State<AppState>,
    Extension(user): Extension<User>,
    body: Result<Json<CreateTweet>, JsonRejection>,
) -> Result<(StatusCode, Json<TweetCreated>), ServiceError> {
    let tweet_id = svc.create_tweet(&user, json_body(body)?)?;
    Ok((
        StatusCode::CREATED,
        Json(TweetCreated {
            result: true,
            tweet_id,
        }),
    ))
}

/// DELETE /tweets/{id}
async fn delete_tweet(
    State(svc): State<AppState>,
    Extension(user): Extension<User>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Ack>, ServiceError> {
    svc.delete_tweet(&user, path_id(id)?)?;
    Ok(Json(Ack::ok()))
}

/// POST /tweets/{id}/likes
async fn like(
    State(svc): State<AppState>,
    Extension(user): Extension<User>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<(StatusCode, Json<Ack>), ServiceError> {
    svc.like_tweet(&user, path_id(id)?)?;
    Ok((StatusCode::CREATED, Json(Ack::ok())))
}

/// DELETE /tweets/{id}/likes
async fn unlike(
    State(svc): State<AppState>,
    Extension(user): Extension<User>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Ack>, ServiceError> {
    svc.unlike_tweet(&user, path_id(id)?)?;
    Ok(Json(Ack::ok()))
}
