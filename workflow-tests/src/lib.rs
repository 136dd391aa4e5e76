//! Cross-service workflow integration tests library.
//!
//! Provides test infrastructure for running end-to-end tests across the
//! running services over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! # Start auth-service and finanzas-service against a database, then:
//! cargo test -p workflow-tests
//! ```

use anyhow::{anyhow, Result};
use std::sync::Once;
use std::time::Duration;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,workflow_tests=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Service endpoint configuration from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub auth: String,
    pub finanzas: String,
}

impl ServiceEndpoints {
    /// Load endpoints from environment variables or use defaults.
    pub fn from_env() -> Self {
        Self {
            auth: std::env::var("AUTH_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            finanzas: std::env::var("FINANZAS_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8082".to_string()),
        }
    }

    /// Get health check URLs for all services.
    pub fn health_urls(&self) -> Vec<(&'static str, String)> {
        vec![
            ("auth", format!("{}/health", self.auth)),
            ("finanzas", format!("{}/health", self.finanzas)),
        ]
    }
}

/// Context for workflow tests.
///
/// Each test should create a new context with its own account for isolation.
pub struct WorkflowTestContext {
    pub endpoints: ServiceEndpoints,
    pub client: reqwest::Client,
    /// Credentials for the account this context registered.
    pub email: String,
    pub password: String,
    /// Bearer token issued at registration.
    pub token: String,
}

impl WorkflowTestContext {
    /// Create a new context by registering a fresh account with auth-service.
    pub async fn new() -> Result<Self> {
        init_tracing();

        let endpoints = ServiceEndpoints::from_env();
        let client = reqwest::Client::new();

        let email = format!("workflow-{}@example.com", Uuid::new_v4());
        let password = "workflow-test-password".to_string();

        let response = client
            .post(format!("{}/auth/register", endpoints.auth))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "first_name": "Workflow",
                "last_name": "Test",
            }))
            .send()
            .await
            .map_err(|e| anyhow!("Failed to reach auth-service: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Registration failed with status {}",
                response.status()
            ));
        }

        let body: serde_json::Value = response.json().await?;
        let token = body["access_token"]
            .as_str()
            .ok_or_else(|| anyhow!("Register response missing access_token"))?
            .to_string();

        Ok(Self {
            endpoints,
            client,
            email,
            password,
            token,
        })
    }

    /// Log in again with the stored credentials and return a fresh token.
    pub async fn login(&self) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/auth/login", self.endpoints.auth))
            .json(&serde_json::json!({
                "email": self.email,
                "password": self.password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Login failed with status {}", response.status()));
        }

        let body: serde_json::Value = response.json().await?;
        body["access_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Login response missing access_token"))
    }
}

/// Wait for all services to be healthy.
///
/// Polls health endpoints until all services respond with 200 OK.
/// Times out after the specified duration.
pub async fn wait_for_services(timeout: Duration) -> Result<()> {
    let endpoints = ServiceEndpoints::from_env();
    let health_urls = endpoints.health_urls();
    let client = reqwest::Client::new();
    let start = std::time::Instant::now();

    tracing::info!("Waiting for {} services to be healthy...", health_urls.len());

    loop {
        let mut all_healthy = true;
        let mut unhealthy_services = Vec::new();

        for (name, url) in &health_urls {
            match client.get(url).timeout(Duration::from_secs(2)).send().await {
                Ok(resp) if resp.status().is_success() => {
                    // Service is healthy
                }
                Ok(resp) => {
                    all_healthy = false;
                    unhealthy_services.push(format!("{} (status: {})", name, resp.status()));
                }
                Err(e) => {
                    all_healthy = false;
                    unhealthy_services.push(format!("{} (error: {})", name, e));
                }
            }
        }

        if all_healthy {
            tracing::info!("All services are healthy");
            return Ok(());
        }

        if start.elapsed() > timeout {
            return Err(anyhow!(
                "Timeout waiting for services. Unhealthy: {}",
                unhealthy_services.join(", ")
            ));
        }

        tracing::debug!("Waiting for services: {}", unhealthy_services.join(", "));
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_endpoints_from_env_uses_defaults() {
        let endpoints = ServiceEndpoints::from_env();
        assert!(endpoints.auth.starts_with("http"));
        assert!(endpoints.finanzas.starts_with("http"));
    }
}
