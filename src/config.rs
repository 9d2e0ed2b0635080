use std::env;

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

/// Fallback signing secret used outside production when `JWT_SECRET` is unset.
const LOCAL_JWT_SECRET: &str = "local-development-secret-change-me";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// shared read-only through the application state; the Token Service and the
/// Persistence Gateway are constructed from it and never consult the environment again.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and secret fail-fast rules.
    pub env: Env,
    // TCP port the HTTP server binds to.
    pub port: u16,
    pub db_host: String,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_port: u16,
    // HMAC secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    // Whether demo users are inserted into an empty database at startup.
    pub seed_data: bool,
}

/// Env
///
/// Defines the runtime context: pretty logs and relaxed secrets locally,
/// JSON logs and mandatory secrets in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("{var} is not a valid number: {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var} is not a valid boolean: {value:?}")]
    InvalidBool { var: &'static str, value: String },
}

impl Default for AppConfig {
    /// Safe local configuration used by tests and state scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            port: 8080,
            db_host: "localhost".to_string(),
            db_user: "postgres".to_string(),
            db_password: "postgres".to_string(),
            db_name: "blog_db".to_string(),
            db_port: 5432,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            seed_data: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables. Implements the **fail-fast**
    /// principle: a production deployment without `JWT_SECRET`, or any malformed
    /// numeric/boolean value, aborts startup instead of running half-configured.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match (&env, env::var("JWT_SECRET")) {
            (_, Ok(secret)) if !secret.is_empty() => secret,
            (Env::Production, _) => return Err(ConfigError::Missing("JWT_SECRET")),
            (Env::Local, _) => LOCAL_JWT_SECRET.to_string(),
        };

        let defaults = Self::default();
        Ok(Self {
            port: parse_port("SERVER_PORT", defaults.port)?,
            db_host: var_or("DB_HOST", defaults.db_host),
            db_user: var_or("DB_USER", defaults.db_user),
            db_password: var_or("DB_PASSWORD", defaults.db_password),
            db_name: var_or("DB_NAME", defaults.db_name),
            db_port: parse_port("DB_PORT", defaults.db_port)?,
            seed_data: parse_bool("SEED_DATA", env == Env::Local)?,
            jwt_secret,
            env,
        })
    }

    /// Connection parameters for the PostgreSQL pool.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name)
    }
}

fn var_or(var: &'static str, default: String) -> String {
    env::var(var).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}

fn parse_port(var: &'static str, default: u16) -> Result<u16, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        _ => Ok(default),
    }
}

fn parse_bool(var: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidBool { var, value }),
        },
        _ => Ok(default),
    }
}
