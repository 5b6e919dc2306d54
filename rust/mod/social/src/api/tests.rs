use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::api::build_router;
use crate::model::CreateTweet;
use crate::service::testing::{test_service, user};
use crate::service::SocialService;

// =====================================================================
// Helpers
// =====================================================================

/// Seeded service: admin (id 1, key "admin"), sf (id 2, key "test"),
/// tweet 1 by admin liked by sf.
fn seeded() -> (Arc<SocialService>, axum::Router, tempfile::TempDir) {
    let (svc, dir) = test_service();
    svc.seed_defaults().unwrap();
    let router = build_router(svc.clone());
    (svc, router, dir)
}

async fn read(resp: axum::response::Response) -> (StatusCode, serde_json::Value) {
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        json!(null)
    } else {
        serde_json::from_slice(&bytes).unwrap_or(json!(null))
    };
    (status, json)
}

async fn api(
    router: &axum::Router,
    method: &str,
    uri: &str,
    key: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("api-key", key);
    }
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let body = match body {
        Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
        None => Body::empty(),
    };
    let req = builder.body(body).unwrap();
    read(router.clone().oneshot(req).await.unwrap()).await
}

fn multipart(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "XBOUNDARYX";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

async fn upload(
    router: &axum::Router,
    key: &str,
    field: &str,
    data: &[u8],
) -> (StatusCode, serde_json::Value) {
    let (content_type, body) = multipart(field, "pic.png", "image/png", data);
    let req = Request::builder()
        .method("POST")
        .uri("/medias")
        .header("api-key", key)
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap();
    read(router.clone().oneshot(req).await.unwrap()).await
}

// =====================================================================
// Authentication
// =====================================================================

#[tokio::test]
async fn missing_or_unknown_key_is_401() {
    let (_svc, router, _dir) = seeded();

    for key in [None, Some("nope")] {
        let (status, body) = api(&router, "GET", "/users/me", key, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["result"], false);
        assert_eq!(body["detail"], "Access is denied for unauthorized users");
    }

    let (status, _) = api(&router, "POST", "/tweets", None, Some(json!({"tweet_data": "x"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// =====================================================================
// Users and follows
// =====================================================================

#[tokio::test]
async fn me_returns_profile() {
    let (_svc, router, _dir) = seeded();

    let (status, body) = api(&router, "GET", "/users/me", Some("test"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "result": true,
            "user": {"id": 2, "name": "sf", "followers": [], "following": []}
        })
    );
}

#[tokio::test]
async fn follow_is_visible_from_both_sides() {
    let (_svc, router, _dir) = seeded();

    let (status, body) = api(&router, "POST", "/users/2/follow", Some("admin"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"result": true}));

    let (_, body) = api(&router, "GET", "/users/2", Some("admin"), None).await;
    assert_eq!(body["user"]["followers"], json!([{"id": 1, "name": "admin"}]));
    assert_eq!(body["user"]["following"], json!([]));

    let (_, body) = api(&router, "GET", "/users/me", Some("admin"), None).await;
    assert_eq!(body["user"]["following"], json!([{"id": 2, "name": "sf"}]));
}

#[tokio::test]
async fn follow_twice_then_unfollow_twice() {
    let (_svc, router, _dir) = seeded();

    let (status, _) = api(&router, "POST", "/users/2/follow", Some("admin"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = api(&router, "POST", "/users/2/follow", Some("admin"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Вы уже подписаны на пользователя с id# 2");

    let (_, body) = api(&router, "GET", "/users/2", Some("admin"), None).await;
    assert_eq!(body["user"]["followers"].as_array().unwrap().len(), 1);

    let (status, _) = api(&router, "DELETE", "/users/2/follow", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = api(&router, "DELETE", "/users/2/follow", Some("admin"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Вы не подписаны на пользователя с id# 2");
}

#[tokio::test]
async fn follow_self_is_400() {
    let (_svc, router, _dir) = seeded();

    let (status, body) = api(&router, "POST", "/users/1/follow", Some("admin"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result"], false);
    assert_eq!(body["message"], "Вы не можете подписаться на самого себя!");
}

#[tokio::test]
async fn unknown_user_is_404() {
    let (_svc, router, _dir) = seeded();

    for (method, uri) in [
        ("GET", "/users/42"),
        ("POST", "/users/42/follow"),
        ("DELETE", "/users/42/follow"),
    ] {
        let (status, body) = api(&router, method, uri, Some("admin"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body["message"], "Пользователь с id# 42 не найден");
    }
}

#[tokio::test]
async fn malformed_id_is_400() {
    let (_svc, router, _dir) = seeded();
    let (status, body) = api(&router, "GET", "/users/abc", Some("admin"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result"], false);
}

// =====================================================================
// Tweets and likes
// =====================================================================

#[tokio::test]
async fn seeded_feed() {
    let (_svc, router, _dir) = seeded();

    let (status, body) = api(&router, "GET", "/tweets", Some("test"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "result": true,
            "tweets": [{
                "id": 1,
                "content": "first tweet",
                "attachments": [],
                "author": {"id": 1, "name": "admin"},
                "likes": [{"user_id": 2, "name": "sf"}]
            }]
        })
    );
}

#[tokio::test]
async fn seeded_like_is_already_present() {
    let (_svc, router, _dir) = seeded();

    let (status, body) = api(&router, "POST", "/tweets/1/likes", Some("test"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Вы уже лайкнули твит с id# 1");
}

#[tokio::test]
async fn like_fresh_tweet() {
    let (svc, router, _dir) = seeded();
    let carol = user(&svc, "carol");

    let (status, body) = api(
        &router,
        "POST",
        "/tweets",
        Some("admin"),
        Some(json!({"tweet_data": "fresh"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["tweet_id"].as_i64().unwrap();

    let uri = format!("/tweets/{id}/likes");
    let (status, body) = api(&router, "POST", &uri, Some("carol-key"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"result": true}));

    let (status, _) = api(&router, "POST", &uri, Some("carol-key"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let likes = svc.get_tweet(id).unwrap().unwrap().likes;
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0].user_id, carol.id);

    let (status, _) = api(&router, "DELETE", &uri, Some("carol-key"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = api(&router, "DELETE", &uri, Some("carol-key"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], format!("Вы ещё не лайкнули твит с id# {id}!"));
}

#[tokio::test]
async fn like_own_tweet_is_400() {
    let (_svc, router, _dir) = seeded();

    // Before and after the author's tweet has other likes.
    let (status, body) = api(&router, "POST", "/tweets/1/likes", Some("admin"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Нельзя поставить лайк самому себе!");

    let (status, _) = api(&router, "DELETE", "/tweets/1/likes", Some("test"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = api(&router, "POST", "/tweets/1/likes", Some("admin"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_tweet_is_404() {
    let (_svc, router, _dir) = seeded();

    for (method, uri) in [
        ("POST", "/tweets/99/likes"),
        ("DELETE", "/tweets/99/likes"),
        ("DELETE", "/tweets/99"),
    ] {
        let (status, body) = api(&router, method, uri, Some("test"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body["message"], "Твит с id# 99 не найден");
    }
}

#[tokio::test]
async fn delete_requires_ownership() {
    let (svc, router, _dir) = seeded();

    let (status, body) = api(&router, "DELETE", "/tweets/1", Some("test"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Нельзя удалить чужой твит!");
    assert!(svc.get_tweet(1).unwrap().is_some());

    let (status, body) = api(&router, "DELETE", "/tweets/1", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"result": true}));

    let (_, body) = api(&router, "GET", "/tweets", Some("admin"), None).await;
    assert_eq!(body["tweets"], json!([]));

    let (status, _) = api(&router, "DELETE", "/tweets/1", Some("admin"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_tweet_rejects_bad_input() {
    let (_svc, router, _dir) = seeded();

    let (status, body) = api(
        &router,
        "POST",
        "/tweets",
        Some("admin"),
        Some(json!({"tweet_data": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Текст твита не может быть пустым");

    let (status, body) = api(
        &router,
        "POST",
        "/tweets",
        Some("admin"),
        Some(json!({"text": "wrong field"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result"], false);
}

// =====================================================================
// Media
// =====================================================================

#[tokio::test]
async fn upload_attach_and_download() {
    let (_svc, router, _dir) = seeded();

    let (status, body) = upload(&router, "admin", "file", b"\x89PNG-bytes").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["result"], true);
    let media_id = body["media_id"].as_i64().unwrap();

    let (status, body) = api(
        &router,
        "POST",
        "/tweets",
        Some("admin"),
        Some(json!({"tweet_data": "with pic", "tweet_media_ids": [media_id, 404]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let tweet_id = body["tweet_id"].as_i64().unwrap();

    let (_, body) = api(&router, "GET", "/tweets", Some("test"), None).await;
    let tweet = &body["tweets"][0];
    assert_eq!(tweet["id"], tweet_id);
    assert_eq!(tweet["attachments"], json!([format!("/api/medias/{media_id}")]));

    let (status, body) = api(&router, "GET", "/medias", Some("test"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "result": true,
            "medias": [{"media_id": media_id, "path": format!("/api/medias/{media_id}")}]
        })
    );

    // Download needs no api key.
    let req = Request::builder()
        .method("GET")
        .uri(format!("/medias/{media_id}"))
        .body(Body::empty())
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "image/png");
    let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    assert_eq!(&bytes[..], b"\x89PNG-bytes");
}

#[tokio::test]
async fn upload_without_file_field() {
    let (_svc, router, _dir) = seeded();

    let (status, body) = upload(&router, "admin", "other", b"data").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Файл не передан");
}

#[tokio::test]
async fn upload_requires_key() {
    let (_svc, router, _dir) = seeded();
    let (status, _) = upload(&router, "nobody", "file", b"data").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_media_is_404() {
    let (_svc, router, _dir) = seeded();
    let (status, body) = api(&router, "GET", "/medias/5", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Медиа с id# 5 не найден");
}

#[tokio::test]
async fn attachments_follow_service_prefix() {
    let (svc, router, _dir) = seeded();
    let m = svc.create_media("a.gif", Some("image/gif"), b"GIF").unwrap();
    let admin = svc.get_user(1).unwrap().unwrap();
    svc.create_tweet(&admin, CreateTweet {
        tweet_data: "gif".to_string(),
        tweet_media_ids: vec![m.id],
    })
    .unwrap();

    let (_, body) = api(&router, "GET", "/tweets", Some("admin"), None).await;
    assert_eq!(body["tweets"][0]["attachments"][0], m.path);
}
