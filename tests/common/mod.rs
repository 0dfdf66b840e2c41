//! Common test utilities

use std::path::Path;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt;

use merchant_pay::{build_router, build_state, Config};

pub const USERNAME: &str = "user";
pub const PASSWORD: &str = "correct_password";
pub const MERCHANT_ID: &str = "merchant-001";

/// Router over a freshly seeded data directory
pub struct TestApp {
    pub app: Router,
    pub dir: TempDir,
}

impl TestApp {
    pub fn data_file(&self, name: &str) -> Value {
        read_json(&self.dir.path().join(name))
    }
}

pub fn test_config(data_dir: &Path, legacy_refresh_status: bool) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        access_secret: "test-access-secret".to_string(),
        refresh_secret: "test-refresh-secret".to_string(),
        access_token_ttl_minutes: 15,
        refresh_token_ttl_days: 7,
        data_dir: data_dir.to_path_buf(),
        history_enabled: true,
        legacy_refresh_status,
    }
}

/// Seed customers/merchants/histories and build the app
pub fn setup_with(legacy_refresh_status: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();

    write_json(
        &dir.path().join("customers.json"),
        &json!([
            {
                "id": "cust-001",
                "name": "Test User",
                "username": USERNAME,
                "password": PASSWORD,
                "balance": 1000.0
            }
        ]),
    );
    write_json(
        &dir.path().join("merchants.json"),
        &json!([
            {
                "id": MERCHANT_ID,
                "name": "Merchant A",
                "bank_account": "1234567890",
                "bank_name": "Bank A",
                "balance": 500.0
            }
        ]),
    );
    write_json(&dir.path().join("histories.json"), &json!([]));

    let state = build_state(&test_config(dir.path(), legacy_refresh_status)).unwrap();

    TestApp {
        app: build_router(state),
        dir,
    }
}

pub fn setup() -> TestApp {
    setup_with(false)
}

pub fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

/// Balances are written as decimal strings; seed files may still hold numbers
pub fn balance(value: &Value) -> Decimal {
    serde_json::from_value(value["balance"].clone()).unwrap()
}

/// POST a raw body and return the status and decoded JSON envelope
pub async fn post_raw(app: &Router, uri: &str, body: &str, bearer: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn post_json(app: &Router, uri: &str, body: Value, bearer: Option<&str>) -> (StatusCode, Value) {
    post_raw(app, uri, &body.to_string(), bearer).await
}

/// Log in with the seeded credentials, returning (access, refresh)
pub async fn login(app: &Router) -> (String, String) {
    let (status, body) = post_json(
        app,
        "/v1/auth/login",
        json!({ "username": USERNAME, "password": PASSWORD }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    (
        body["data"]["access_token"].as_str().unwrap().to_string(),
        body["data"]["refresh_token"].as_str().unwrap().to_string(),
    )
}
