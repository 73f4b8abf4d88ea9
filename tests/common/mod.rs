#![allow(dead_code)]

use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use warbler::config::{Config, SecurityConfig};
use warbler::db::Store;
use warbler::models::user::{NewUser, User};

/// Cheap argon2 parameters so tests do not spend seconds hashing.
pub fn test_security() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    }
}

pub struct TestDb {
    pub path: PathBuf,
    pub url: String,
}

impl TestDb {
    pub fn new(prefix: &str) -> Self {
        let path = std::env::temp_dir().join(format!("{prefix}-{}.db", uuid::Uuid::new_v4()));
        let url = format!("sqlite:{}", path.display());
        Self { path, url }
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.general.database_url = self.url.clone();
        config.server.secure_cookies = false;
        config.security = test_security();
        config.observability.metrics_enabled = false;
        config
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub async fn spawn_store(prefix: &str) -> (Store, TestDb) {
    let db = TestDb::new(prefix);
    let store = Store::new(&db.url).await.expect("Failed to open store");
    (store, db)
}

pub async fn create_user(store: &Store, username: &str, email: &str, password: &str) -> User {
    store
        .create_user(
            NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                image_url: None,
            },
            &test_security(),
        )
        .await
        .expect("Failed to create user")
}

pub struct TestApp {
    pub router: Router,
    pub store: Store,
    _db: TestDb,
}

pub async fn spawn_app(prefix: &str) -> TestApp {
    let db = TestDb::new(prefix);
    let state = warbler::api::create_app_state_from_config(db.config(), None)
        .await
        .expect("Failed to create app state");
    let store = state.store().clone();

    TestApp {
        router: warbler::api::router(state),
        store,
        _db: db,
    }
}

/// A browser stand-in: remembers the session cookie between requests.
pub struct Client {
    router: Router,
    cookie: Option<String>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: serde_json::Value,
}

impl Client {
    pub fn new(app: &TestApp) -> Self {
        Self {
            router: app.router.clone(),
            cookie: None,
        }
    }

    pub fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// POST an urlencoded form body. Values must already be form-safe.
    pub async fn post(&mut self, uri: &str, form: &str) -> TestResponse {
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Follow a redirect the way a browser would.
    pub async fn follow(&mut self, response: &TestResponse) -> TestResponse {
        let location = response
            .location
            .clone()
            .expect("response was not a redirect");
        self.get(&location).await
    }

    pub async fn login(&mut self, username: &str, password: &str) {
        let response = self
            .post("/login", &format!("username={username}&password={password}"))
            .await;
        assert_eq!(response.status, StatusCode::FOUND, "login failed: {}", response.body);
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        self.remember_cookie(&response);

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        TestResponse {
            status,
            location,
            body,
        }
    }

    fn remember_cookie(&mut self, response: &Response<Body>) {
        let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        else {
            return;
        };

        let pair = set_cookie.split(';').next().unwrap_or_default().trim();
        let expired = set_cookie.contains("Max-Age=0") || pair.ends_with('=');
        self.cookie = if expired { None } else { Some(pair.to_string()) };
    }
}

pub fn flash_messages(body: &serde_json::Value) -> Vec<String> {
    body["flashes"]
        .as_array()
        .map(|flashes| {
            flashes
                .iter()
                .filter_map(|f| f["message"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
