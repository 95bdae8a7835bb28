//! Integration tests for the dashboard backend.

use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use sqlx::{Row, SqlitePool};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, DataSource};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    pool: Option<SqlitePool>,
    _temp_dir: Option<TempDir>,
}

impl TestFixture {
    /// Backend with no store behind it: every read serves sample data.
    async fn without_store() -> Self {
        Self::start(DataSource::without_store(), None, None).await
    }

    /// Backend with a throwaway SQLite store.
    async fn with_store() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        let pool = init_database(&db_path, 5).await.expect("Failed to init DB");

        Self::start(DataSource::new(pool.clone()), Some(pool), Some(temp_dir)).await
    }

    async fn start(data: DataSource, pool: Option<SqlitePool>, temp_dir: Option<TempDir>) -> Self {
        let config = Config {
            db_path: None,
            db_max_connections: 5,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        };

        let state = AppState {
            data,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            pool,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn seed_user(&self, username: &str, password: &str, role: &str) {
        sqlx::query(
            "INSERT INTO users (username, password, role, email, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(username)
        .bind(password)
        .bind(role)
        .bind(format!("{}@iot.example", username))
        .bind(Utc::now())
        .execute(self.pool.as_ref().unwrap())
        .await
        .expect("Failed to seed user");
    }
}

// ==================== HEALTH ====================

#[tokio::test]
async fn test_health_without_store() {
    let fixture = TestFixture::without_store().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["database"]["connected"], false);
    assert_eq!(body["database"]["status"], "unavailable");
}

#[tokio::test]
async fn test_health_with_store() {
    let fixture = TestFixture::with_store().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["database"]["connected"], true);
    assert_eq!(body["database"]["status"], "healthy");
}

// ==================== DEVICES ====================

#[tokio::test]
async fn test_list_devices_without_store_serves_sample_set() {
    let fixture = TestFixture::without_store().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/devices"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["dataSource"], "simulated");
    assert_eq!(body["count"], 3);

    let devices = body["data"].as_array().unwrap();
    assert_eq!(devices[0]["id"], "DEV-001");
    assert_eq!(devices[1]["id"], "DEV-002");
    assert_eq!(devices[2]["id"], "DEV-003");
}

#[tokio::test]
async fn test_get_sample_device() {
    let fixture = TestFixture::without_store().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/devices/DEV-001"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Sensor Temperatura Exterior");
    assert_eq!(body["data"]["status"], "online");
    assert_eq!(body["dataSource"], "simulated");
}

#[tokio::test]
async fn test_get_unknown_device_is_not_found() {
    let fixture = TestFixture::without_store().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/devices/DEV-999"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_writes_without_store_require_store() {
    let fixture = TestFixture::without_store().await;

    // Create
    let resp = fixture
        .client
        .post(fixture.url("/api/devices"))
        .json(&json!({
            "id": "DEV-100",
            "name": "New Sensor",
            "type": "Sensor",
            "location": "Lab"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "STORE_REQUIRED");

    // The sample set stays untouched
    let list: Value = fixture
        .client
        .get(fixture.url("/api/devices"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["count"], 3);

    // Update and delete degrade the same way
    let resp = fixture
        .client
        .put(fixture.url("/api/devices/DEV-001"))
        .json(&json!({ "name": "Renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);

    let resp = fixture
        .client
        .delete(fixture.url("/api/devices/DEV-001"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
}

#[tokio::test]
async fn test_device_crud_with_store() {
    let fixture = TestFixture::with_store().await;

    // Create device
    let create_resp = fixture
        .client
        .post(fixture.url("/api/devices"))
        .json(&json!({
            "id": "DEV-100",
            "name": "Lab Thermometer",
            "type": "Temperature Sensor",
            "location": "Lab",
            "status": "online",
            "value": 21.0,
            "unit": "°C",
            "battery": 77,
            "signal": "good"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    assert_eq!(create_body["success"], true);
    assert_eq!(create_body["dataSource"], "database");
    assert_eq!(create_body["data"]["id"], "DEV-100");

    // Duplicate id conflicts
    let dup_resp = fixture
        .client
        .post(fixture.url("/api/devices"))
        .json(&json!({
            "id": "DEV-100",
            "name": "Duplicate",
            "type": "Sensor",
            "location": "Lab"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(dup_resp.status(), 409);
    let dup_body: Value = dup_resp.json().await.unwrap();
    assert_eq!(dup_body["error"]["code"], "CONFLICT");

    // Get device
    let get_resp = fixture
        .client
        .get(fixture.url("/api/devices/DEV-100"))
        .send()
        .await
        .unwrap();
    assert_eq!(get_resp.status(), 200);
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["dataSource"], "database");
    assert_eq!(get_body["data"]["name"], "Lab Thermometer");

    // List devices: the store result, never merged with the sample set
    let list_body: Value = fixture
        .client
        .get(fixture.url("/api/devices"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list_body["count"], 1);
    assert_eq!(list_body["dataSource"], "database");

    // Partial update keeps unmentioned fields
    let update_resp = fixture
        .client
        .put(fixture.url("/api/devices/DEV-100"))
        .json(&json!({ "value": 22.5, "status": "warning" }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["value"], 22.5);
    assert_eq!(update_body["data"]["status"], "warning");
    assert_eq!(update_body["data"]["name"], "Lab Thermometer");

    // Delete device
    let delete_resp = fixture
        .client
        .delete(fixture.url("/api/devices/DEV-100"))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    // Verify deleted
    let get_deleted = fixture
        .client
        .get(fixture.url("/api/devices/DEV-100"))
        .send()
        .await
        .unwrap();
    assert_eq!(get_deleted.status(), 404);
}

#[tokio::test]
async fn test_create_device_validation() {
    let fixture = TestFixture::with_store().await;

    // Missing required fields
    let resp = fixture
        .client
        .post(fixture.url("/api/devices"))
        .json(&json!({ "id": "DEV-101" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Battery out of range
    let resp = fixture
        .client
        .post(fixture.url("/api/devices"))
        .json(&json!({
            "id": "DEV-101",
            "name": "Sensor",
            "type": "Sensor",
            "location": "Lab",
            "battery": 150
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

// ==================== DASHBOARD ====================

#[tokio::test]
async fn test_dashboard_without_store() {
    let fixture = TestFixture::without_store().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/dashboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["dataSource"], "simulated");

    let kpis = &body["data"]["kpis"];
    assert_eq!(kpis["temperature"]["current"], 24.3);
    assert_eq!(kpis["humidity"]["current"], 68.5);
    assert_eq!(kpis["activeDevices"]["current"], 2);
    assert_eq!(kpis["activeDevices"]["total"], 3);
    assert_eq!(kpis["alerts"]["current"], 1);
    assert_eq!(kpis["alerts"]["warning"], 1);
    assert_eq!(kpis["alerts"]["critical"], 0);

    assert_eq!(body["data"]["devices"].as_array().unwrap().len(), 3);
    assert_eq!(
        body["data"]["temperatureHistory"].as_array().unwrap().len(),
        24
    );
    assert_eq!(body["data"]["settings"]["refreshInterval"], 30);
}

#[tokio::test]
async fn test_dashboard_kpis_are_idempotent() {
    let fixture = TestFixture::without_store().await;

    let first: Value = fixture
        .client
        .get(fixture.url("/api/dashboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: Value = fixture
        .client
        .get(fixture.url("/api/dashboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // KPI counts and averages are stable; only the history noise varies
    assert_eq!(first["data"]["kpis"], second["data"]["kpis"]);
}

#[tokio::test]
async fn test_dashboard_defaults_with_empty_store() {
    let fixture = TestFixture::with_store().await;

    let body: Value = fixture
        .client
        .get(fixture.url("/api/dashboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["dataSource"], "database");
    assert_eq!(body["data"]["kpis"]["temperature"]["current"], 23.5);
    assert_eq!(body["data"]["kpis"]["humidity"]["current"], 65.0);
    assert_eq!(body["data"]["kpis"]["activeDevices"]["total"], 0);
}

// ==================== AUTH ====================

#[tokio::test]
async fn test_login_local_fallback() {
    let fixture = TestFixture::without_store().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "username": "admin", "password": "admin123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["username"], "admin");
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert_eq!(body["data"]["authSource"], "local");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let fixture = TestFixture::without_store().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "username": "admin", "password": "wrong-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "AUTH_FAILED");
}

#[tokio::test]
async fn test_login_validation() {
    let fixture = TestFixture::without_store().await;

    // Missing credentials
    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Username too short
    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "username": "ab", "password": "admin123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Password too short
    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "username": "admin", "password": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_login_database_user_and_audit_log() {
    let fixture = TestFixture::with_store().await;
    fixture.seed_user("operator", "operator1", "user").await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "username": "operator", "password": "operator1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["authSource"], "database");
    assert_eq!(body["data"]["user"]["role"], "user");

    // A failed attempt still lands in the audit log
    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "username": "operator", "password": "bad-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let row = sqlx::query("SELECT COUNT(*) AS n, SUM(success) AS ok FROM login_attempts")
        .fetch_one(fixture.pool.as_ref().unwrap())
        .await
        .unwrap();
    let attempts: i64 = row.get("n");
    let successes: i64 = row.get("ok");
    assert_eq!(attempts, 2);
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn test_local_users_still_work_with_store() {
    // A store with no matching row falls through to the local table
    let fixture = TestFixture::with_store().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/login"))
        .json(&json!({ "username": "demo", "password": "demo123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["authSource"], "local");
    assert_eq!(body["data"]["user"]["role"], "demo");
}

#[tokio::test]
async fn test_auth_verify_and_logout() {
    let fixture = TestFixture::without_store().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/auth/verify"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .post(fixture.url("/api/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
}

// ==================== DEGRADATION ====================

#[tokio::test]
async fn test_reads_degrade_when_store_fails_mid_flight() {
    let fixture = TestFixture::with_store().await;

    // Closing the pool makes every subsequent query fail
    fixture.pool.as_ref().unwrap().close().await;

    // Reads fall back to sample data without surfacing an error
    let body: Value = fixture
        .client
        .get(fixture.url("/api/devices"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["dataSource"], "simulated_fallback");
    assert_eq!(body["count"], 3);

    let dash: Value = fixture
        .client
        .get(fixture.url("/api/dashboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dash["dataSource"], "simulated_fallback");

    // Writes surface the failure instead of fabricating a result
    let resp = fixture
        .client
        .post(fixture.url("/api/devices"))
        .json(&json!({
            "id": "DEV-200",
            "name": "Sensor",
            "type": "Sensor",
            "location": "Lab"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "QUERY_ERROR");

    // Health degrades to a structured unhealthy report, never an error
    let health: Value = fixture
        .client
        .get(fixture.url("/api/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["database"]["connected"], false);
    assert_eq!(health["database"]["status"], "unhealthy");
}
