//! Database table export
//!
//! Tables are written through the [`TableSink`] trait. [`MssqlSink`] is the
//! SQL Server implementation built on `tiberius`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tiberius::{AuthMethod, Client, Config, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::app::models::Observation;
use crate::constants::export::{
    DB_CONNECT_TIMEOUT, DEFAULT_DB_HOST, DEFAULT_DB_PORT, INSERT_BATCH_ROWS, MAX_TABLE_NAME_LENGTH, TEXT_COLUMN_WIDTH,
};
use crate::errors::{ExportError, ExportResult};

/// Where and as whom to connect for a database export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip)]
    pub password: String,
    /// Database to use; the login's default database when empty
    pub database: String,
    pub trust_server_certificate: bool,
    /// Seconds allowed to connect and log in
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    DB_CONNECT_TIMEOUT.as_secs()
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            trust_server_certificate: true,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ConnectionInfo {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    fn tiberius_config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.host);
        config.port(self.port);
        if !self.database.is_empty() {
            config.database(&self.database);
        }
        config.authentication(AuthMethod::sql_server(&self.user, &self.password));
        if self.trust_server_certificate {
            config.trust_cert();
        }
        config
    }
}

/// Destination able to replace a two-column text table
#[async_trait]
pub trait TableSink: Send {
    /// Drop `table_name` if it exists, recreate it with text columns
    /// `timeperiod` and `value`, and insert `rows` in order
    async fn replace_table(&mut self, table_name: &str, rows: &[Observation]) -> ExportResult<()>;
}

/// Check that `name` is a plain identifier safe to embed in DDL
///
/// # Errors
///
/// Returns `ExportError::InvalidTableName` describing the first problem found
pub fn validate_table_name(name: &str) -> ExportResult<()> {
    let invalid = |reason: &str| ExportError::InvalidTableName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let first = name.chars().next().ok_or_else(|| invalid("name is empty"))?;
    if name.len() > MAX_TABLE_NAME_LENGTH {
        return Err(invalid("name is too long"));
    }
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(invalid("must start with a letter or underscore"));
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(invalid(&format!("illegal character '{}'", c)));
    }
    Ok(())
}

/// SQL Server connection used as a table sink
pub struct MssqlSink {
    client: Client<Compat<TcpStream>>,
}

impl MssqlSink {
    /// Open a connection and log in
    ///
    /// Connecting and the login handshake together are bounded by
    /// `info.connect_timeout()`.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::DatabaseUnavailable` if the server cannot be
    /// reached, rejects the login or does not answer in time
    pub async fn connect(info: &ConnectionInfo) -> ExportResult<Self> {
        let unavailable = |reason: String| ExportError::DatabaseUnavailable {
            host: info.host.clone(),
            port: info.port,
            reason,
        };

        let config = info.tiberius_config();
        let timeout = info.connect_timeout();
        tracing::debug!(
            "Connecting to SQL Server at {} (timeout {:?})",
            config.get_addr(),
            timeout
        );

        let login = async {
            let tcp = TcpStream::connect(config.get_addr())
                .await
                .map_err(|e| unavailable(e.to_string()))?;
            tcp.set_nodelay(true).map_err(|e| unavailable(e.to_string()))?;

            Client::connect(config, tcp.compat_write())
                .await
                .map_err(|e| unavailable(e.to_string()))
        };

        let client = tokio::time::timeout(timeout, login)
            .await
            .map_err(|_| unavailable(format!("no answer within {}s", timeout.as_secs())))??;

        tracing::info!("Connected to SQL Server at {}:{}", info.host, info.port);
        Ok(Self { client })
    }

    async fn run(&mut self, sql: &str) -> ExportResult<()> {
        self.client.simple_query(sql).await?.into_results().await?;
        Ok(())
    }

    async fn write_table(&mut self, table_name: &str, rows: &[Observation]) -> ExportResult<()> {
        self.run(&format!("DROP TABLE IF EXISTS [{}]", table_name))
            .await?;
        self.run(&format!(
            "CREATE TABLE [{name}] (timeperiod NVARCHAR({width}), value NVARCHAR({width}))",
            name = table_name,
            width = TEXT_COLUMN_WIDTH
        ))
        .await?;

        for chunk in rows.chunks(INSERT_BATCH_ROWS) {
            let values_clauses: Vec<String> = (0..chunk.len())
                .map(|i| format!("(@P{}, @P{})", i * 2 + 1, i * 2 + 2))
                .collect();
            let sql = format!(
                "INSERT INTO [{}] (timeperiod, value) VALUES {}",
                table_name,
                values_clauses.join(", ")
            );

            let mut insert = Query::new(sql);
            for observation in chunk {
                insert.bind(observation.timeperiod.as_str());
                insert.bind(observation.value.as_str());
            }
            insert.execute(&mut self.client).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl TableSink for MssqlSink {
    async fn replace_table(&mut self, table_name: &str, rows: &[Observation]) -> ExportResult<()> {
        validate_table_name(table_name)?;

        self.run("BEGIN TRANSACTION").await?;
        match self.write_table(table_name, rows).await {
            Ok(()) => {
                self.run("COMMIT TRANSACTION").await?;
                tracing::info!("Replaced table {} with {} rows", table_name, rows.len());
                Ok(())
            }
            Err(e) => {
                if let Err(rollback) = self.run("ROLLBACK TRANSACTION").await {
                    tracing::warn!("Rollback of {} failed: {}", table_name, rollback);
                }
                Err(e)
            }
        }
    }
}
