use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query},
    http::{Request, Response, StatusCode, header},
    routing::{get, post},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};

use flick_catalog::{CatalogConfig, TmdbClient};
use flick_db::Database;
use flick_db::models::ProviderProfile;
use flick_types::api::Principal;
use flick_types::models::User;

use crate::auth::issue_token;
use crate::oauth::{OAuthSettings, Provider, ProviderConfig, ProviderEndpoints};
use crate::state::{AppState, AppStateInner, SessionSettings};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Router wired to an in-memory database, a fake TMDB and a fake GitHub.
    pub async fn spawn() -> Self {
        let upstream = spawn_fake_upstream().await;

        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            catalog: TmdbClient::new(CatalogConfig {
                base_url: format!("{upstream}/tmdb"),
                ..CatalogConfig::new("test-key")
            }),
            session: SessionSettings {
                secret: "test-session-secret".into(),
                ttl: chrono::Duration::days(1),
                secure_cookies: false,
            },
            oauth: OAuthSettings {
                public_url: "http://localhost:3000".into(),
                login_redirect: "/profile".into(),
                providers: vec![ProviderConfig {
                    provider: Provider::GitHub,
                    client_id: "gh-client".into(),
                    client_secret: "gh-secret".into(),
                    endpoints: ProviderEndpoints {
                        authorize: format!("{upstream}/github/authorize"),
                        token: format!("{upstream}/github/token"),
                        userinfo: format!("{upstream}/github/user"),
                    },
                }],
            },
            http: reqwest::Client::new(),
        });

        Self {
            router: crate::router(state.clone()),
            state,
        }
    }

    /// Create a user directly in storage and return a session token for it.
    pub fn sign_in(&self, account_id: &str) -> (Principal, String) {
        let user = self
            .state
            .db
            .upsert_user_for_account(&ProviderProfile {
                provider: "github".into(),
                account_id: account_id.into(),
                name: Some(format!("user-{account_id}")),
                email: None,
                image: None,
            })
            .unwrap();
        let token = issue_token(&self.state.session, &user).unwrap();
        let principal = Principal {
            user_id: user.id,
            name: user.name,
        };
        (principal, token)
    }

    /// A correctly signed token for a user that was never stored.
    pub fn token_for_unknown_user(&self) -> String {
        let ghost = User {
            id: uuid::Uuid::new_v4(),
            name: Some("ghost".into()),
            email: None,
            image: None,
            created_at: chrono::Utc::now(),
        };
        issue_token(&self.state.session, &ghost).unwrap()
    }

    pub fn media_item_count(&self) -> i64 {
        self.state
            .db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM media_items", [], |r| r.get(0))?))
            .unwrap()
    }
}

pub fn request(method: &str, uri: &str, cookie_token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = cookie_token {
        builder = builder.header(header::COOKIE, format!("flick_session={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, cookie_token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = cookie_token {
        builder = builder.header(header::COOKIE, format!("flick_session={token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Value of the named cookie from the response's `Set-Cookie` headers.
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix(&prefix))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
}

/// One axum server standing in for both TMDB (`/tmdb/...`) and GitHub
/// (`/github/...`).
async fn spawn_fake_upstream() -> String {
    async fn search(Query(q): Query<HashMap<String, String>>) -> Result<Json<Value>, StatusCode> {
        if q.get("query").map(String::as_str) == Some("boom") {
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
        Ok(Json(json!({
            "results": [
                { "id": 27205, "media_type": "movie", "title": "Inception", "poster_path": "/i.jpg" },
                { "id": 525, "media_type": "person", "name": "Christopher Nolan" },
                { "id": 1399, "media_type": "tv", "name": "Game of Thrones", "poster_path": "/g.jpg" }
            ]
        })))
    }

    async fn movie(Path(id): Path<u64>) -> Json<Value> {
        Json(json!({ "id": id, "title": "Inception", "genres": [] }))
    }

    async fn popular() -> Json<Value> {
        Json(json!({ "results": [{ "id": 27205, "title": "Inception", "poster_path": "/i.jpg" }] }))
    }

    async fn token() -> Json<Value> {
        Json(json!({ "access_token": "gh-access-token", "token_type": "bearer", "scope": "read:user" }))
    }

    async fn user(headers: axum::http::HeaderMap) -> Result<Json<Value>, StatusCode> {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if auth != Some("Bearer gh-access-token") {
            return Err(StatusCode::UNAUTHORIZED);
        }
        Ok(Json(json!({
            "id": 42,
            "login": "ana",
            "name": "Ana",
            "email": "ana@example.com",
            "avatar_url": "https://avatars.example/42"
        })))
    }

    let app = Router::new()
        .route("/tmdb/search/multi", get(search))
        .route("/tmdb/movie/popular", get(popular))
        .route("/tmdb/movie/{id}", get(movie))
        .route("/github/token", post(token))
        .route("/github/user", get(user));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}
