//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Connection settings for the S3-compatible (MinIO) document bucket.
#[derive(Clone, Debug)]
pub struct ObjectStoreSettings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub use_ssl: bool,
    pub bucket: String,
    pub region: String,
}

impl ObjectStoreSettings {
    /// The endpoint as a URL, with the scheme derived from `use_ssl`.
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://") {
            return self.endpoint.clone();
        }
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint)
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub object_store: ObjectStoreSettings,
    pub worker_enqueue_url: String,
    pub enqueue_timeout: Duration,
    pub max_upload_bytes: usize,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address = parse_var(&lookup, "APP_ADDR", "0.0.0.0:4000")?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        let database_max_connections = parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", "5")?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Object Storage ---
        let object_store = ObjectStoreSettings {
            endpoint: var_or("MINIO_ENDPOINT", "localhost:9000"),
            access_key: var_or("MINIO_ACCESS_KEY", "minioadmin"),
            secret_key: var_or("MINIO_SECRET_KEY", "minioadmin"),
            use_ssl: parse_var(&lookup, "MINIO_SSL", "false")?,
            bucket: var_or("MINIO_BUCKET", "palabra"),
            region: var_or("MINIO_REGION", "us-east-1"),
        };

        // --- Worker and HTTP Settings ---
        let worker_enqueue_url = var_or("WORKER_ENQUEUE_URL", "http://worker-api:8000/enqueue/book");
        let enqueue_timeout = Duration::from_secs(parse_var(&lookup, "ENQUEUE_TIMEOUT_SECS", "5")?);
        let max_upload_bytes = parse_var(&lookup, "MAX_UPLOAD_BYTES", "10485760")?;
        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:3000");

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            object_store,
            worker_enqueue_url,
            enqueue_timeout,
            max_upload_bytes,
            cors_origin,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config =
            Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/palabra")])).unwrap();

        assert_eq!(config.bind_address.port(), 4000);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.object_store.bucket, "palabra");
        assert_eq!(config.object_store.endpoint_url(), "http://localhost:9000");
        assert_eq!(config.worker_enqueue_url, "http://worker-api:8000/enqueue/book");
        assert_eq!(config.enqueue_timeout, Duration::from_secs(5));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn missing_database_url_is_reported() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ref key) if key == "DATABASE_URL"));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/palabra"),
            ("MINIO_SSL", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "MINIO_SSL"));

        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/palabra"),
            ("APP_ADDR", "not-an-address"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "APP_ADDR"));
    }

    #[test]
    fn ssl_switches_the_endpoint_scheme() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/palabra"),
            ("MINIO_ENDPOINT", "minio.internal:9000"),
            ("MINIO_SSL", "true"),
        ]))
        .unwrap();
        assert_eq!(config.object_store.endpoint_url(), "https://minio.internal:9000");
    }
}
