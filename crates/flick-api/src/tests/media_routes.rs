use axum::http::{StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::support::*;

#[tokio::test]
async fn second_post_updates_status_without_duplicating() {
    let app = TestApp::spawn().await;
    let (principal, token) = app.sign_in("u1");

    let first = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/media",
            Some(&token),
            &json!({ "mediaId": "27205", "mediaType": "movie", "title": "Inception", "status": "WATCHING" }),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = json_body(first).await;
    assert_eq!(first["status"], "WATCHING");
    assert_eq!(first["userId"], principal.user_id.to_string());
    assert_eq!(first["isLiked"], false);

    let second = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/media",
            Some(&token),
            &json!({ "mediaId": "27205", "mediaType": "movie", "title": "Inception", "status": "COMPLETED" }),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second = json_body(second).await;

    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["status"], "COMPLETED");
    assert_eq!(app.media_item_count(), 1);
}

#[tokio::test]
async fn get_returns_stored_row_or_null_404() {
    let app = TestApp::spawn().await;
    let (_, token) = app.sign_in("u1");

    let missing = app
        .router
        .clone()
        .oneshot(request("GET", "/api/media?mediaId=27205", Some(&token)))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(missing).await, Value::Null);

    app.router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/media",
            Some(&token),
            &json!({ "mediaId": 27205, "mediaType": "movie", "title": "Inception", "isWatchlisted": true }),
        ))
        .await
        .unwrap();

    let found = app
        .router
        .clone()
        .oneshot(request("GET", "/api/media?mediaId=27205", Some(&token)))
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    let body = json_body(found).await;
    assert_eq!(body["mediaId"], "27205");
    assert_eq!(body["isWatchlisted"], true);
    assert_eq!(body["status"], Value::Null);
}

#[tokio::test]
async fn unauthenticated_calls_get_401_and_store_nothing() {
    let app = TestApp::spawn().await;

    let post = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/media",
            None,
            &json!({ "mediaId": "27205", "mediaType": "movie", "title": "Inception" }),
        ))
        .await
        .unwrap();
    assert_eq!(post.status(), StatusCode::UNAUTHORIZED);

    let get = app
        .router
        .clone()
        .oneshot(request("GET", "/api/media?mediaId=27205", None))
        .await
        .unwrap();
    assert_eq!(get.status(), StatusCode::UNAUTHORIZED);

    let forged = app
        .router
        .clone()
        .oneshot(request("GET", "/api/media?mediaId=27205", Some("not-a-token")))
        .await
        .unwrap();
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(app.media_item_count(), 0);
}

#[tokio::test]
async fn token_for_missing_user_is_401_not_a_storage_error() {
    let app = TestApp::spawn().await;
    let token = app.token_for_unknown_user();

    let post = app
        .router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/media",
            Some(&token),
            &json!({ "mediaId": "1", "mediaType": "movie", "title": "x" }),
        ))
        .await
        .unwrap();
    assert_eq!(post.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(post).await["error"], "unauthenticated");

    let library = app
        .router
        .clone()
        .oneshot(request("GET", "/api/library", Some(&token)))
        .await
        .unwrap();
    assert_eq!(library.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(app.media_item_count(), 0);
}

#[tokio::test]
async fn bearer_header_is_accepted() {
    let app = TestApp::spawn().await;
    let (_, token) = app.sign_in("u1");

    let req = axum::http::Request::builder()
        .uri("/api/media?mediaId=1")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_bodies_are_400() {
    let app = TestApp::spawn().await;
    let (_, token) = app.sign_in("u1");

    let bodies = [
        json!({ "mediaType": "movie", "title": "Inception" }),
        json!({ "mediaId": "27205", "title": "Inception" }),
        json!({ "mediaId": "27205", "mediaType": "movie" }),
        json!({ "mediaId": "27205", "mediaType": "anime", "title": "Inception" }),
        json!({ "mediaId": "27205", "mediaType": "movie", "title": "Inception", "status": "BINGED" }),
        json!({ "mediaId": "27205", "mediaType": "movie", "title": "Inception", "rating": 42 }),
    ];

    for body in &bodies {
        let resp = app
            .router
            .clone()
            .oneshot(json_request("POST", "/api/media", Some(&token), body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert!(json_body(resp).await["error"].is_string());
    }

    let missing_query = app
        .router
        .clone()
        .oneshot(request("GET", "/api/media", Some(&token)))
        .await
        .unwrap();
    assert_eq!(missing_query.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.media_item_count(), 0);
}

#[tokio::test]
async fn library_lists_only_the_callers_items() {
    let app = TestApp::spawn().await;
    let (_, alice) = app.sign_in("alice");
    let (_, bob) = app.sign_in("bob");

    for (token, id, status) in [
        (&alice, "1", "WATCHING"),
        (&alice, "2", "COMPLETED"),
        (&bob, "3", "WATCHING"),
    ] {
        let resp = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/media",
                Some(token.as_str()),
                &json!({ "mediaId": id, "mediaType": "tv", "title": format!("Show {id}"), "status": status }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let all = app
        .router
        .clone()
        .oneshot(request("GET", "/api/library", Some(&alice)))
        .await
        .unwrap();
    assert_eq!(all.status(), StatusCode::OK);
    assert_eq!(json_body(all).await.as_array().unwrap().len(), 2);

    let watching = app
        .router
        .clone()
        .oneshot(request("GET", "/api/library?status=WATCHING", Some(&alice)))
        .await
        .unwrap();
    let watching = json_body(watching).await;
    let watching = watching.as_array().unwrap();
    assert_eq!(watching.len(), 1);
    assert_eq!(watching[0]["mediaId"], "1");

    let unknown_status = app
        .router
        .clone()
        .oneshot(request("GET", "/api/library?status=BINGED", Some(&alice)))
        .await
        .unwrap();
    assert_eq!(unknown_status.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(unknown_status).await["error"].is_string());

    let unauthenticated = app
        .router
        .clone()
        .oneshot(request("GET", "/api/library", None))
        .await
        .unwrap();
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);
}
