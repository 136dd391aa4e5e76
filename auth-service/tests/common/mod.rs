//! Common test utilities for auth-service integration tests.

use auth_service::config::{AuthConfig, DatabaseConfig, Environment, JwtConfig};
use auth_service::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CommonConfig;
use std::sync::Once;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "auth-service-test-secret";

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,auth_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Spawn a test application and return its base URL.
pub async fn spawn_app() -> String {
    init_tracing();

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run database-backed tests");

    let config = AuthConfig {
        common: CommonConfig { port: 0 },
        environment: Environment::Dev,
        service_name: "auth-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        database: DatabaseConfig {
            url: database_url,
            max_connections: 2,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: Secret::new(TEST_JWT_SECRET.to_string()),
            issuer: "auth.api".to_string(),
            audience: "finanzas.api".to_string(),
            expiry_minutes: 60,
        },
    };

    let app = Application::build(config)
        .await
        .expect("Failed to build application");
    let port = app.port();

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    format!("http://127.0.0.1:{}", port)
}

/// A unique email address so tests can share a database.
pub fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4())
}

/// Register a user and return the issued access token.
pub async fn register_user(
    client: &reqwest::Client,
    base_url: &str,
    email: &str,
    password: &str,
) -> String {
    let response = client
        .post(format!("{}/auth/register", base_url))
        .json(&serde_json::json!({
            "email": email,
            "password": password,
            "first_name": "Test",
            "last_name": "User",
        }))
        .send()
        .await
        .expect("Failed to execute register request");

    assert!(response.status().is_success(), "Registration should succeed");

    let body: serde_json::Value = response.json().await.expect("Register response not JSON");
    body["access_token"]
        .as_str()
        .expect("Register response missing access_token")
        .to_string()
}
