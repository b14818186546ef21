#![allow(dead_code)]

use axum::http::{HeaderMap, StatusCode, header};
use famdash_server::{server, storage};
use reqwest::Client;
use serde_json::{Value, json};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;

pub struct TestServer {
    pub base: String,
    client: Client,
    handle: tokio::task::JoinHandle<()>,
    _tempdir: tempfile::TempDir,
}

/// Defaults for tests: cheap bcrypt, UTC household.
pub fn test_config() -> server::AppConfig {
    let mut config = server::AppConfig::default();
    config.pin.bcrypt_cost = 4;
    config
}

impl TestServer {
    pub async fn spawn() -> Option<Self> {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: server::AppConfig) -> Option<Self> {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let (addr, handle) = match start_server(&db_path, config).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                eprintln!("Skipping test due to sandbox restrictions: {e}");
                return None;
            }
            Err(e) => panic!("failed to start server: {e}"),
        };
        Some(Self {
            base: format!("http://{}", addr),
            client: Client::new(),
            handle,
            _tempdir: dir,
        })
    }

    pub async fn send(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let url = format!("{}{}", self.base, path);
        let mut req = match method {
            "GET" => self.client.get(&url),
            "POST" => self.client.post(&url),
            "PUT" => self.client.put(&url),
            "DELETE" => self.client.delete(&url),
            other => panic!("unsupported method {other}"),
        };
        if let Some(t) = token {
            req = req.bearer_auth(t);
        }
        if let Some(b) = body {
            req = req.json(&b);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let text = resp.text().await.unwrap();
        let val = if text.is_empty() {
            json!(null)
        } else {
            serde_json::from_str(&text).unwrap_or(json!({"raw": text}))
        };
        (status, headers, val)
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, value) = self.send(method, path, token, body).await;
        (status, value)
    }

    pub async fn request_expect(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Value {
        let (status, value) = self.request(method, path, token, body).await;
        assert_eq!(
            status, expected,
            "{method} {path} returned {status:?} with body {value:?}",
        );
        value
    }

    /// Create a member and return its id.
    pub async fn member(&self, name: &str, role: &str, token: Option<&str>) -> i64 {
        let body = self
            .request_expect(
                "POST",
                "/api/v1/members",
                token,
                Some(json!({"name": name, "role": role})),
                StatusCode::CREATED,
            )
            .await;
        body["id"].as_i64().expect("member id")
    }

    /// Award `points` through a manual bonus.
    pub async fn bonus(&self, member: i64, points: i64, token: Option<&str>) {
        self.request_expect(
            "POST",
            &format!("/api/v1/members/{member}/points"),
            token,
            Some(json!({"amount": points, "type": "BONUS"})),
            StatusCode::CREATED,
        )
        .await;
    }

    pub async fn balance(&self, member: i64) -> i64 {
        let body = self
            .request_expect(
                "GET",
                &format!("/api/v1/members/{member}/points"),
                None,
                None,
                StatusCode::OK,
            )
            .await;
        body["balance"].as_i64().expect("balance")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Session token from a `Set-Cookie: famdash_session=...` response header.
pub fn session_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.strip_prefix("famdash_session="))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
        .find(|v| !v.is_empty())
}

async fn start_server(
    tmp_db: &Path,
    config: server::AppConfig,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>), std::io::Error> {
    let store = storage::Store::connect_sqlite(tmp_db.to_str().unwrap())
        .await
        .expect("db");
    if let Some(seed) = &config.seed {
        store.seed_from_config(seed).await.expect("seed");
    }

    let state = server::AppState::new(config, store).expect("state");
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok((addr, handle))
}
