//! Connection wrapper: one lazily-established tokio-postgres client.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error};

use crate::config::DatabaseConfig;
use crate::error::RecordResult;

/// A handle to one database connection.
///
/// The underlying client is created on first use and kept for the lifetime
/// of the `Database` (or until [`disconnect`](Database::disconnect)). There
/// is no pooling: overlapping statements on the same handle are serialized
/// by the driver's own pipeline.
pub struct Database {
    config: DatabaseConfig,
    client: Mutex<Option<Arc<Client>>>,
}

impl Database {
    /// Wrap the given settings. No I/O happens until the first statement.
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
        }
    }

    /// Convenience constructor over [`DatabaseConfig::from_env`].
    pub fn from_env() -> RecordResult<Self> {
        Ok(Self::new(DatabaseConfig::from_env()?))
    }

    /// Establish the connection if it does not exist yet.
    ///
    /// The driver's background connection task is spawned onto the current
    /// tokio runtime; its eventual termination error (if any) is logged, not
    /// surfaced, since by then no caller is waiting on it.
    pub async fn connect(&self) -> RecordResult<Arc<Client>> {
        let mut guard = self.client.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let (client, connection) = self.config.pg_config().connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "database connection terminated");
            }
        });
        debug!(
            host = %self.config.host,
            database = %self.config.database,
            "database connection established"
        );

        let client = Arc::new(client);
        *guard = Some(client.clone());
        Ok(client)
    }

    /// Drop the connection handle. The next statement reconnects.
    pub async fn disconnect(&self) {
        self.client.lock().await.take();
    }

    /// Execute a statement and return all rows.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> RecordResult<Vec<Row>> {
        let client = self.connect().await?;
        debug!(%sql, "query");
        Ok(client.query(sql, params).await?)
    }

    /// Execute a statement and return the first row, if any.
    pub async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> RecordResult<Option<Row>> {
        let rows = self.query(sql, params).await?;
        Ok(rows.into_iter().next())
    }

    /// Execute a statement and return the affected-row count.
    pub async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> RecordResult<u64> {
        let client = self.connect().await?;
        debug!(%sql, "execute");
        Ok(client.execute(sql, params).await?)
    }
}
