#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use learning_center_server::{AppState, DocumentStore, app_router};
use serde_json::Value;
use tower::util::ServiceExt;

#[derive(Clone)]
pub struct TestConfig {
    pub temp_dir_path: String,
}

impl TestConfig {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let temp_dir_path = temp_dir.path().to_string_lossy().to_string();
        std::mem::forget(temp_dir);
        Ok(Self { temp_dir_path })
    }

    pub fn data_path(&self) -> String {
        self.temp_dir_path.clone()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub data_path: String,
}

pub async fn setup_test_app() -> anyhow::Result<TestApp> {
    let test_config = TestConfig::new()?;
    let data_path = test_config.data_path();

    let store = DocumentStore::open(&data_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open document store: {}", e))?;
    let state = AppState::new(store);
    let router = app_router(state.clone());

    Ok(TestApp {
        router,
        state,
        data_path,
    })
}

fn parse_body_as_json_or_string(bytes: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => value,
        Err(_) => Value::String(String::from_utf8(bytes.to_vec()).expect("utf8 body")),
    }
}

pub async fn json_request(
    app: &TestApp,
    method: &str,
    uri: &str,
    payload: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let body = match payload {
        Some(payload) => Body::from(payload.to_string()),
        None => Body::empty(),
    };
    let request = builder.body(body).expect("build json request");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("execute json request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    (status, parse_body_as_json_or_string(&bytes))
}

/// Sends `body` verbatim, for requests that are not valid JSON.
pub async fn raw_request(app: &TestApp, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build raw request");

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("execute raw request");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    (status, parse_body_as_json_or_string(&bytes))
}

pub async fn get(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    json_request(app, "GET", uri, None).await
}

pub async fn post(app: &TestApp, uri: &str, payload: Value) -> (StatusCode, Value) {
    json_request(app, "POST", uri, Some(payload)).await
}

pub async fn put(app: &TestApp, uri: &str, payload: Value) -> (StatusCode, Value) {
    json_request(app, "PUT", uri, Some(payload)).await
}

pub async fn delete(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    json_request(app, "DELETE", uri, None).await
}

/// POSTs `payload` to `collection` and returns the assigned id.
pub async fn create(app: &TestApp, collection: &str, payload: Value) -> i64 {
    let (status, body) = post(app, &format!("/{}", collection), payload).await;
    assert_eq!(status, StatusCode::CREATED, "create {}: {}", collection, body);
    body["id"].as_i64().expect("numeric id")
}

pub async fn find_by_id(app: &TestApp, collection: &str, id: i64) -> Option<Value> {
    let (status, body) = get(app, &format!("/{}", collection)).await;
    assert_eq!(status, StatusCode::OK);
    body.as_array()
        .expect("array body")
        .iter()
        .find(|record| record["id"].as_i64() == Some(id))
        .cloned()
}

pub fn read_collection(app: &TestApp, collection: &str) -> Value {
    let path = std::path::Path::new(&app.data_path).join(format!("{}.json", collection));
    let raw = std::fs::read_to_string(path).expect("read collection file");
    serde_json::from_str(&raw).expect("collection is valid json")
}

/// Replaces a collection file with `records`, as another writer would.
pub fn write_collection(app: &TestApp, collection: &str, records: Value) {
    let path = std::path::Path::new(&app.data_path).join(format!("{}.json", collection));
    std::fs::write(path, records.to_string()).expect("write collection file");
}
