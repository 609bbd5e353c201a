//! Database component.
//!
//! # Responsibilities
//! - Parse and check the MySQL DSN
//! - Prove the server is reachable before anything depends on it
//!
//! # Design Decisions
//! - An unusable connection is a hard failure, never skipped
//! - The probe is a plain TCP connect with the configured timeout
//! - No logging here: failures surface through the bootstrap fault channel

use std::fmt;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::bootstrap::{Component, ComponentError};
use crate::components::{fill, AppContext};
use crate::config::DatabaseConfig;

pub const DEFAULT_MYSQL_PORT: u16 = 3306;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("invalid database URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported database scheme `{0}` (expected mysql)")]
    UnsupportedScheme(String),

    #[error("database URL has no host")]
    MissingHost,

    #[error("database URL has no database name")]
    MissingDatabaseName,

    #[error("could not resolve {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("database at {address} is unreachable: {source}")]
    Unreachable {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Connection parameters for the store database.
#[derive(Clone)]
pub struct Database {
    url: Url,
    host: String,
    port: u16,
    name: String,
    connect_timeout: Duration,
}

impl Database {
    pub fn from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = Url::parse(&config.url)?;
        if url.scheme() != "mysql" {
            return Err(DatabaseError::UnsupportedScheme(url.scheme().to_string()));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(DatabaseError::MissingHost)?
            .to_string();
        let name = url.path().trim_start_matches('/').to_string();
        if name.is_empty() {
            return Err(DatabaseError::MissingDatabaseName);
        }

        Ok(Self {
            port: url.port().unwrap_or(DEFAULT_MYSQL_PORT),
            host,
            name,
            url,
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn user(&self) -> &str {
        self.url.username()
    }

    /// The DSN with any password masked.
    pub fn redacted_url(&self) -> String {
        let mut url = self.url.clone();
        if url.password().is_some() {
            let _ = url.set_password(Some("***"));
        }
        url.to_string()
    }

    /// Open and immediately close a TCP connection to the server.
    pub fn probe(&self) -> Result<SocketAddr, DatabaseError> {
        let address = format!("{}:{}", self.host, self.port);
        let candidates: Vec<SocketAddr> = address
            .to_socket_addrs()
            .map_err(|source| DatabaseError::Resolve {
                address: address.clone(),
                source,
            })?
            .collect();

        let mut last_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved");
        for candidate in candidates {
            match TcpStream::connect_timeout(&candidate, self.connect_timeout) {
                Ok(_) => return Ok(candidate),
                Err(e) => last_error = e,
            }
        }
        Err(DatabaseError::Unreachable {
            address,
            source: last_error,
        })
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("url", &self.redacted_url())
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

pub struct DatabaseComponent {
    ctx: Arc<AppContext>,
}

impl DatabaseComponent {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }
}

impl Component for DatabaseComponent {
    fn initialize(&self) -> Result<(), ComponentError> {
        let config = self.ctx.require_config()?;
        let database = Database::from_config(&config.database)
            .map_err(|e| ComponentError::wrap("invalid database settings", e))?;

        if config.database.probe_on_startup {
            database
                .probe()
                .map_err(|e| ComponentError::wrap("no usable database connection", e))?;
        }

        fill(&self.ctx.database, database);
        Ok(())
    }
}
