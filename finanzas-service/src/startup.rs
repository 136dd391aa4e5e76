//! Application startup and lifecycle management.

use crate::config::FinanzasConfig;
use crate::services::Database;
use crate::{build_router, AppState};
use service_core::error::AppError;
use service_core::token::TokenVerifier;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    ///
    /// The token verifier is constructed here so a missing or empty shared
    /// secret stops the service before it accepts a single request.
    pub async fn build(config: FinanzasConfig) -> Result<Self, AppError> {
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        db.run_migrations().await?;

        let verifier = TokenVerifier::new(&config.jwt.token_config())?;

        let state = AppState {
            config: config.clone(),
            db,
            verifier,
        };

        // Port 0 binds a random port for testing.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("finanzas-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router).await
    }
}
