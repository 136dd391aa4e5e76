use secrecy::Secret;
use service_core::config::{self as core_config, get_env};
use service_core::error::AppError;
use service_core::token::{TokenConfig, DEFAULT_LEEWAY_SECONDS};
use std::env;

#[derive(Debug, Clone)]
pub struct FinanzasConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub jwt: JwtVerifierConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Verification side of the shared token parameters. This service never signs
/// anything; it only checks tokens minted by auth-service.
#[derive(Debug, Clone)]
pub struct JwtVerifierConfig {
    pub secret: Secret<String>,
    pub issuer: String,
    pub audience: String,
    pub leeway_seconds: u64,
}

impl JwtVerifierConfig {
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.secret.clone(),
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            leeway_seconds: self.leeway_seconds,
        }
    }
}

impl FinanzasConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(FinanzasConfig {
            common: common_config,
            service_name: get_env("SERVICE_NAME", Some("finanzas-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
            },
            jwt: JwtVerifierConfig {
                secret: Secret::new(get_env("JWT_SECRET", None, is_prod)?),
                issuer: get_env("JWT_ISSUER", Some("auth.api"), is_prod)?,
                audience: get_env("JWT_AUDIENCE", Some("finanzas.api"), is_prod)?,
                leeway_seconds: get_env(
                    "JWT_LEEWAY_SECONDS",
                    Some(&DEFAULT_LEEWAY_SECONDS.to_string()),
                    is_prod,
                )?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            },
        })
    }
}
