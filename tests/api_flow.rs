//! End-to-end HTTP tests: a full server over the in-memory store, driven
//! with `reqwest` and HS256 bearer tokens.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{EncodingKey, Header};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{Value, json};

use ladder_gateway::api;
use ladder_gateway::app_state::AppState;
use ladder_gateway::config::GatewayConfig;
use ladder_gateway::persistence::MemoryStore;

const SECRET: &str = "integration-secret";

#[derive(Serialize)]
struct TokenClaims<'a> {
    sub: &'a str,
    exp: i64,
}

fn token(sub: &str) -> String {
    let claims = TokenClaims {
        sub,
        exp: chrono::Utc::now().timestamp() + 600,
    };
    let Ok(token) = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    ) else {
        panic!("token encoding failed");
    };
    token
}

struct TestServer {
    base: String,
    client: reqwest::Client,
}

impl TestServer {
    async fn spawn() -> Self {
        let config = GatewayConfig {
            auth_jwt_secret: Some(SECRET.to_string()),
            trust_body_identity: false,
            ..GatewayConfig::default()
        };
        let state = AppState::from_config(&config, Arc::new(MemoryStore::new()));
        let app = api::build_app(state, Duration::from_secs(5));

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self::at(addr)
    }

    fn at(addr: SocketAddr) -> Self {
        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(user) = user {
            request = request.bearer_auth(token(user));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let Ok(response) = request.send().await else {
            panic!("request to {path} failed");
        };
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let value = serde_json::from_str(&text).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create_league(&self, owner: &str, name: &str, visibility: &str) -> Value {
        let (status, league) = self
            .send(
                reqwest::Method::POST,
                "/api/v1/leagues",
                Some(owner),
                Some(json!({ "name": name, "visibility": visibility })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{league}");
        league
    }
}

#[tokio::test]
async fn campus_ladder_end_to_end() {
    let server = TestServer::spawn().await;
    let league = server.create_league("coach", "Campus Ladder", "public").await;
    let id = league["id"].as_str().unwrap_or_default().to_string();
    let code = league["inviteCode"].as_str().unwrap_or_default().to_string();
    assert_eq!(code.len(), 6);

    let join_path = format!("/api/v1/join/{}", code.to_lowercase());
    let (status, membership) = server
        .send(reqwest::Method::POST, &join_path, Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::CREATED, "{membership}");
    assert_eq!(membership["leagueId"], json!(id));

    let (status, body) = server
        .send(reqwest::Method::POST, &join_path, Some("u1"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], json!("conflict"));

    let (status, game) = server
        .send(
            reqwest::Method::POST,
            &format!("/api/v1/leagues/{id}/matches"),
            Some("coach"),
            Some(json!({
                "participants": [
                    { "name": "Kyle", "points": 11 },
                    { "name": "Max", "points": 8 }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{game}");
    assert_eq!(game["seq"], json!(1));

    let (status, standings) = server
        .send(
            reqwest::Method::GET,
            &format!("/api/v1/leagues/{id}/standings"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(standings["matchCount"], json!(1));
    let rows = standings["rows"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["name"], json!("Kyle"));
    assert_eq!(rows[0]["record"], json!("1-0"));
    assert_eq!(rows[0]["winPct"], json!(1.0));
    assert_eq!(rows[0]["winPctDisplay"], json!("100.0%"));
    assert_eq!(rows[0]["streakLabel"], json!("W1"));
    assert_eq!(rows[1]["name"], json!("Max"));
    assert_eq!(rows[1]["record"], json!("0-1"));
    assert_eq!(rows[1]["winPct"], json!(0.0));
    assert_eq!(rows[1]["winPctDisplay"], json!("0.0%"));
    assert_eq!(rows[1]["streakLabel"], json!("L1"));

    let (status, players) = server
        .send(
            reqwest::Method::GET,
            &format!("/api/v1/leagues/{id}/players"),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(players.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn anonymous_create_is_unauthorized() {
    let server = TestServer::spawn().await;
    let (status, body) = server
        .send(
            reqwest::Method::POST,
            "/api/v1/leagues",
            None,
            Some(json!({ "name": "Nobody's League", "visibility": "public" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!("unauthorized"));
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let server = TestServer::spawn().await;
    let Ok(response) = server
        .client
        .get(server.url("/api/v1/memberships"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
    else {
        panic!("request failed");
    };
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_owner_rename_is_forbidden_and_hides_invite_code() {
    let server = TestServer::spawn().await;
    let league = server.create_league("coach", "Open Ladder", "public").await;
    let id = league["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = server
        .send(
            reqwest::Method::PATCH,
            &format!("/api/v1/leagues/{id}"),
            Some("mallory"),
            Some(json!({ "name": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, seen) = server
        .send(
            reqwest::Method::GET,
            &format!("/api/v1/leagues/{id}"),
            Some("mallory"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(seen["name"], json!("Open Ladder"));
    assert!(seen.get("inviteCode").is_none());
}

#[tokio::test]
async fn private_league_is_not_found_for_strangers() {
    let server = TestServer::spawn().await;
    let league = server.create_league("coach", "Staff Only", "private").await;
    let id = league["id"].as_str().unwrap_or_default().to_string();

    for user in [None, Some("stranger")] {
        let (status, _) = server
            .send(
                reqwest::Method::GET,
                &format!("/api/v1/leagues/{id}/standings"),
                user,
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (status, _) = server
        .send(
            reqwest::Method::GET,
            &format!("/api/v1/leagues/{id}"),
            Some("coach"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_from_an_empty_log_is_not_found() {
    let server = TestServer::spawn().await;
    let league = server.create_league("coach", "Quiet League", "public").await;
    let id = league["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = server
        .send(
            reqwest::Method::DELETE,
            &format!("/api/v1/leagues/{id}/matches/last"),
            Some("coach"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn().await;
    let (status, body) = server
        .send(reqwest::Method::GET, "/health", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
}
