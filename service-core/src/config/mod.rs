//! Configuration loading shared by every service.
//!
//! Two layers. The common section ([`Config`]) comes from an optional
//! `configuration` file overridden by `APP__`-prefixed environment variables
//! (`APP__PORT=8081`); `.env` files are honored for local development.
//! Service-specific values are read directly from the environment through
//! [`get_env`], so every required setting is checked once at startup and a
//! missing secret or database URL can never surface at request time.

use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

/// Settings every service shares, regardless of what it does.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Listen port. 0 asks the OS for a free one, which the test harnesses
    /// rely on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// Read one environment variable with required-at-startup semantics.
///
/// In prod nothing is defaulted: every listed value must be set explicitly.
/// In dev the default applies when the variable is absent. A `None` default
/// marks the value as required everywhere (signing secrets, database URLs).
pub fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) if is_prod => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} is required in production but not set",
            key
        ))),
        Err(_) => match default {
            Some(def) => Ok(def.to_string()),
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}
