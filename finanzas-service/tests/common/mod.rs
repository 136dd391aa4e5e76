//! Common test utilities for finanzas-service integration tests.

use chrono::Utc;
use finanzas_service::config::{DatabaseConfig, FinanzasConfig, JwtVerifierConfig};
use finanzas_service::startup::Application;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::Secret;
use service_core::config::Config as CommonConfig;
use service_core::token::{Claims, DEFAULT_LEEWAY_SECONDS};
use std::collections::HashMap;
use std::sync::Once;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "finanzas-service-test-secret";
pub const TEST_ISSUER: &str = "auth.api";
pub const TEST_AUDIENCE: &str = "finanzas.api";

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,finanzas_service=debug,sqlx=warn")
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

    let config = FinanzasConfig {
        common: CommonConfig { port: 0 },
        service_name: "finanzas-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        database: DatabaseConfig {
            url: database_url,
            max_connections: 2,
            min_connections: 1,
        },
        jwt: JwtVerifierConfig {
            secret: Secret::new(TEST_JWT_SECRET.to_string()),
            issuer: TEST_ISSUER.to_string(),
            audience: TEST_AUDIENCE.to_string(),
            leeway_seconds: DEFAULT_LEEWAY_SECONDS,
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

/// Mint a token for `user_id` the way auth-service would, using the shared
/// test secret.
pub fn mint_token(user_id: Uuid) -> String {
    mint_token_with_secret(user_id, TEST_JWT_SECRET)
}

/// Mint a token signed with an arbitrary secret, for negative tests.
pub fn mint_token_with_secret(user_id: Uuid, secret: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iss: TEST_ISSUER.to_string(),
        aud: TEST_AUDIENCE.to_string(),
        iat: now,
        nbf: now,
        exp: now + 3600,
        extra: HashMap::new(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to encode test token")
}

/// Create a category and return its id.
pub async fn create_category(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
) -> Uuid {
    let response = client
        .post(format!("{}/categories", base_url))
        .bearer_auth(token)
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await
        .expect("Failed to execute create category request");

    assert_eq!(
        response.status(),
        reqwest::StatusCode::CREATED,
        "Category creation should succeed"
    );

    let body: serde_json::Value = response.json().await.expect("Category response not JSON");
    body["id"]
        .as_str()
        .expect("Category response missing id")
        .parse()
        .expect("Category id is not a UUID")
}

/// A category name unique across test runs, so tests can share a database.
pub fn unique_name(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}
