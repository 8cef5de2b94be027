//! Connection settings for the recipe store.

use std::time::Duration;

/// Environment variable that overrides the connection URL.
pub const DATABASE_URL_VAR: &str = "LADLE_DATABASE_URL";

/// Connection settings for the recipe store.
///
/// Carries the target URL plus the pool sizing knobs. The defaults suit a
/// single CLI process against a local postgres.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// How long to wait for a free connection before giving up.
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// Connection URL used when neither flag nor environment provides one.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/ladle";

    const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Build a config from an explicit URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// The database named by the URL's path, with any query string stripped.
    ///
    /// `None` when the URL has no path component.
    pub fn database_name(&self) -> Option<&str> {
        let without_params = match self.database_url.split_once('?') {
            Some((base, _)) => base,
            None => self.database_url.as_str(),
        };
        let (_, name) = without_params.rsplit_once('/')?;
        // A URL without a path rsplits at the scheme's slashes; the
        // host:port tail is not a database name.
        if name.is_empty() || name.contains(':') || name.contains('@') {
            return None;
        }
        Some(name)
    }

    /// URL for the `postgres` maintenance database on the same server, used
    /// to issue `CREATE DATABASE` before the target database exists.
    pub fn maintenance_url(&self) -> String {
        let base = match self.database_url.split_once('?') {
            Some((stripped, _)) => stripped,
            None => self.database_url.as_str(),
        };
        match self.database_name() {
            Some(name) => format!("{}postgres", &base[..base.len() - name.len()]),
            None => format!("{base}/postgres"),
        }
    }
}
