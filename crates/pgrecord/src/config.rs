//! Connection settings, constructed explicitly or from the environment.

use crate::error::{RecordError, RecordResult};

/// Default Postgres port when `DB_PORT` is not set.
const DEFAULT_PORT: u16 = 5432;

/// Connection settings for a [`Database`](crate::Database).
///
/// Build one at startup and hand it to every `Database` you construct; there
/// is no process-wide default. [`DatabaseConfig::from_env`] covers the common
/// case of reading settings from `.env` / environment variables.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

impl DatabaseConfig {
    /// Create settings from explicit values.
    ///
    /// Returns [`RecordError::Configuration`] when `host` is empty — without
    /// a host no connection is possible.
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: Option<String>,
        database: impl Into<String>,
    ) -> RecordResult<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(RecordError::configuration(
                "database connection impossible: no host provided",
            ));
        }
        Ok(Self {
            host,
            port: DEFAULT_PORT,
            user: user.into(),
            password,
            database: database.into(),
        })
    }

    /// Override the port (defaults to 5432).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Read settings from the environment.
    ///
    /// Loads `.env` first (missing files are fine), then reads `DB_HOST`,
    /// `DB_USER`, `DB_PASS`, `DB_NAME` and optionally `DB_PORT`. A missing
    /// `DB_HOST` is a [`RecordError::Configuration`] failure.
    pub fn from_env() -> RecordResult<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("DB_HOST").map_err(|_| {
            RecordError::configuration(
                "database connection impossible: set DB_HOST or construct DatabaseConfig explicitly",
            )
        })?;
        let user = std::env::var("DB_USER").unwrap_or_default();
        let password = std::env::var("DB_PASS").ok();
        let database = std::env::var("DB_NAME").unwrap_or_default();
        let port = match std::env::var("DB_PORT") {
            Ok(raw) => raw.parse().map_err(|_| {
                RecordError::configuration(format!("DB_PORT is not a port number: {raw}"))
            })?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self::new(host, user, password, database)?.port(port))
    }

    /// Render the driver-level connection config.
    pub(crate) fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .dbname(&self.database);
        if let Some(password) = &self.password {
            config.password(password);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_host_is_a_configuration_error() {
        let err = DatabaseConfig::new("", "root", None, "app").unwrap_err();
        assert!(matches!(err, RecordError::Configuration(_)));
    }

    #[test]
    fn explicit_settings() {
        let config = DatabaseConfig::new("localhost", "root", None, "app")
            .unwrap()
            .port(5433);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5433);
        assert_eq!(config.password, None);
    }
}
