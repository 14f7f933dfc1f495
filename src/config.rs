//! Storage configuration for the `PostgreSQL` adapters.
//!
//! ```no_run
//! use slotswap::config::StoreConfig;
//! use slotswap::slot::adapters::postgres::PostgresSlotRepository;
//!
//! let config = StoreConfig::from_env().expect("database configuration");
//! let pool = config.build_pool().expect("connection pool");
//! let slots = PostgresSlotRepository::new(pool);
//! # let _ = slots;
//! ```

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the database connection URL.
pub const DATABASE_URL_ENV: &str = "SLOTSWAP_DATABASE_URL";
/// Environment variable overriding the pool size.
pub const MAX_CONNECTIONS_ENV: &str = "SLOTSWAP_DB_MAX_CONNECTIONS";
/// Environment variable overriding the connection timeout in seconds.
pub const CONNECT_TIMEOUT_ENV: &str = "SLOTSWAP_DB_CONNECT_TIMEOUT_SECS";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Connection pool type shared by the slot and negotiation adapters.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Errors raised while loading configuration or building the pool.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A setting is present but cannot be parsed.
    #[error("invalid value {value:?} for {name}")]
    Invalid {
        /// Setting name.
        name: &'static str,
        /// Raw value that failed to parse.
        value: String,
    },

    /// The connection pool could not be created.
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

/// `PostgreSQL` store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection URL, for example `postgres://user@localhost/slotswap`.
    pub database_url: String,
    /// Upper bound on pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

const fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

const fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl StoreConfig {
    /// Creates a configuration with default pool settings.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when [`DATABASE_URL_ENV`] is unset
    /// and [`ConfigError::Invalid`] when a numeric override does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`StoreConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup(DATABASE_URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing(DATABASE_URL_ENV))?;

        let mut config = Self::new(database_url);
        if let Some(raw) = lookup(MAX_CONNECTIONS_ENV) {
            config.max_connections = parse_setting(MAX_CONNECTIONS_ENV, &raw)?;
            if config.max_connections == 0 {
                return Err(ConfigError::Invalid {
                    name: MAX_CONNECTIONS_ENV,
                    value: raw,
                });
            }
        }
        if let Some(raw) = lookup(CONNECT_TIMEOUT_ENV) {
            config.connect_timeout_secs = parse_setting(CONNECT_TIMEOUT_ENV, &raw)?;
        }
        Ok(config)
    }

    /// Returns the connection timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Builds the `r2d2` pool used by the `PostgreSQL` adapters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pool`] when no connection can be established
    /// within the timeout.
    pub fn build_pool(&self) -> Result<PgPool, ConfigError> {
        let manager = ConnectionManager::<PgConnection>::new(&self.database_url);
        let pool = Pool::builder()
            .max_size(self.max_connections)
            .connection_timeout(self.connect_timeout())
            .build(manager)?;
        tracing::debug!(
            max_connections = self.max_connections,
            "postgres connection pool ready"
        );
        Ok(pool)
    }
}

fn parse_setting<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_owned(),
    })
}
