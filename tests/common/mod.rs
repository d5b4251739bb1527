#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use invite::config::{RemoteConfig, SiteConfig};
use invite::store::Store;

pub const TEST_PIN: &str = "2468";

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    /// App in local storage mode over a fresh in-memory database.
    pub async fn new() -> Self {
        Self::build(None, Self::test_site()).await
    }

    /// App in local storage mode with custom site settings.
    pub async fn with_site(site: SiteConfig) -> Self {
        Self::build(None, site).await
    }

    fn test_site() -> SiteConfig {
        SiteConfig {
            event_title: "Sam & Alex".to_string(),
            admin_pin: TEST_PIN.to_string(),
            ..SiteConfig::default()
        }
    }

    /// App in cloud storage mode pointed at `base_url`.
    pub async fn with_remote(base_url: &str) -> Self {
        let remote = RemoteConfig::from_parts(
            Some(base_url.to_string()),
            Some("test-anon-key".to_string()),
        );
        assert!(remote.is_some(), "test remote config should be usable");
        Self::build(remote, Self::test_site()).await
    }

    async fn build(remote: Option<RemoteConfig>, site: SiteConfig) -> Self {
        let pool = invite::db::memory_pool()
            .await
            .expect("Failed to create in-memory SQLite pool");

        let store = Store::new(pool.clone(), remote);

        let router = invite::build_app(pool.clone(), store, site, false)
            .await
            .expect("Failed to build app");

        Self { router, db: pool }
    }

    /// A second handle onto the same local storage, for assertions.
    pub fn local_store(&self) -> Store {
        Store::new(self.db.clone(), None)
    }

    /// Overwrite a local storage slot with raw text.
    pub async fn put_slot(&self, key: &str, value: &str) {
        sqlx::query("INSERT OR REPLACE INTO kv_slots (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.db)
            .await
            .expect("Failed to seed slot");
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        tower::ServiceExt::oneshot(self.router.clone(), req)
            .await
            .unwrap()
    }

    /// Unlock the admin dashboard and return the session cookie string.
    pub async fn unlock(&self) -> String {
        let resp = self
            .post_form("/admin/unlock", &format!("pin={TEST_PIN}"), None)
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        resp.headers()
            .get("set-cookie")
            .expect("Unlock should set a session cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    /// Send a GET request with an optional session cookie.
    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }

    /// Send a POST form request with an optional session cookie.
    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();
        self.request(req).await
    }

    /// Send a DELETE request with an optional session cookie.
    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri).method("DELETE");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let req = builder.body(Body::empty()).unwrap();
        self.request(req).await
    }
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Assert that a response is a redirect to the given location.
pub fn assert_redirect(resp: &Response, expected_location: &str) {
    assert!(
        resp.status().is_redirection(),
        "Expected redirect, got {}",
        resp.status()
    );
    let location = resp
        .headers()
        .get("location")
        .expect("Redirect should have location header")
        .to_str()
        .unwrap();
    assert_eq!(location, expected_location);
}

/// One request as seen by [`FakeBackend`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn param(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Default)]
struct FakeState {
    requests: Vec<Recorded>,
    rsvps: String,
    updates: String,
    failure: Option<(StatusCode, String)>,
}

/// In-process stand-in for the hosted REST endpoint. GETs return the canned
/// rows for the resource, writes return 201/204 with no body.
#[derive(Clone)]
pub struct FakeBackend {
    pub base_url: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState {
            rsvps: "[]".to_string(),
            updates: "[]".to_string(),
            ..FakeState::default()
        }));

        let app = Router::new().fallback(fake_handler).with_state(state.clone());
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn set_rsvps(&self, rows: serde_json::Value) {
        self.state.lock().unwrap().rsvps = rows.to_string();
    }

    pub fn set_updates(&self, rows: serde_json::Value) {
        self.state.lock().unwrap().updates = rows.to_string();
    }

    pub fn fail_with(&self, status: StatusCode, body: &str) {
        self.state.lock().unwrap().failure = Some((status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("no request recorded")
    }
}

async fn fake_handler(
    State(state): State<Arc<Mutex<FakeState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut state = state.lock().unwrap();
    state.requests.push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    if let Some((status, body)) = state.failure.clone() {
        return (status, body).into_response();
    }

    match method {
        Method::GET => {
            let rows = if uri.path().ends_with("/updates") {
                state.updates.clone()
            } else {
                state.rsvps.clone()
            };
            (StatusCode::OK, [("content-type", "application/json")], rows).into_response()
        }
        Method::POST => StatusCode::CREATED.into_response(),
        _ => StatusCode::NO_CONTENT.into_response(),
    }
}
