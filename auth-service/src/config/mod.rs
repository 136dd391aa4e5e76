use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{self as core_config, get_env};
use service_core::error::AppError;
use service_core::token::TokenConfig;
use std::env;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub issuer: String,
    pub audience: String,
    pub expiry_minutes: i64,
}

impl JwtConfig {
    /// Shared token parameters for issuing and for verifying our own tokens.
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig::new(
            self.secret.clone(),
            self.issuer.clone(),
            self.audience.clone(),
        )
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        // A non-positive configured lifetime falls back to the 60-minute default.
        let mut expiry_minutes: i64 = get_env("JWT_EXPIRY_MINUTES", Some("60"), is_prod)?
            .parse()
            .map_err(|e: std::num::ParseIntError| {
                AppError::ConfigError(anyhow::anyhow!(e.to_string()))
            })?;
        if expiry_minutes <= 0 {
            expiry_minutes = 60;
        }

        Ok(AuthConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("auth-service"), is_prod)?,
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
            jwt: JwtConfig {
                secret: Secret::new(get_env("JWT_SECRET", None, is_prod)?),
                issuer: get_env("JWT_ISSUER", Some("auth.api"), is_prod)?,
                audience: get_env("JWT_AUDIENCE", Some("finanzas.api"), is_prod)?,
                expiry_minutes,
            },
        })
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
