//! Process configuration, read once from the environment at startup.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::http::HeaderValue;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";
pub const DEFAULT_LOG_FILTER: &str = "info,todo_server=debug";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Any origin, any method, any header.
    Any,
    /// Only the given origin.
    Origin(HeaderValue),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub cors: CorsPolicy,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };
        let host = match var("HOST") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "HOST",
                value: raw,
            })?,
            None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        let cors = match var("CORS_ORIGIN") {
            None => CorsPolicy::Any,
            Some(raw) if raw == "*" => CorsPolicy::Any,
            Some(raw) => HeaderValue::from_str(&raw)
                .map(CorsPolicy::Origin)
                .map_err(|_| ConfigError::Invalid {
                    name: "CORS_ORIGIN",
                    value: raw,
                })?,
        };

        let log_filter = var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        if EnvFilter::try_new(&log_filter).is_err() {
            return Err(ConfigError::Invalid {
                name: "RUST_LOG",
                value: log_filter,
            });
        }

        Ok(Self {
            host,
            port,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            cors,
            log_filter,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
