//! PostgreSQL wire backend implementation
//!
//! Redshift speaks the PostgreSQL protocol, so the warehouse session is a
//! single `tokio_postgres` client. One connection is opened per run and never
//! pooled: transaction scope must stay tied to that one session.

use async_trait::async_trait;
use std::time::{Duration, Instant};

use super::{Connector, DatabaseError, DatabaseResult, QueryResult, WarehouseSession};
use crate::config::WarehouseSection;

/// Opens sessions against the configured warehouse
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    warehouse: WarehouseSection,
}

impl PostgresConnector {
    pub fn new(warehouse: WarehouseSection) -> Self {
        Self { warehouse }
    }

    fn client_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.warehouse.host)
            .port(self.warehouse.port)
            .dbname(&self.warehouse.database)
            .user(&self.warehouse.user)
            .application_name("oecd-loader");
        if let Some(password) = &self.warehouse.password {
            config.password(password);
        }
        if let Some(secs) = self.warehouse.connect_timeout_secs {
            config.connect_timeout(Duration::from_secs(secs));
        }
        config
    }
}

#[async_trait(?Send)]
impl Connector for PostgresConnector {
    type Session = PostgresSession;

    async fn connect(&self) -> DatabaseResult<PostgresSession> {
        tracing::info!(warehouse = %self.warehouse.summary(), "connecting to warehouse");

        let (client, connection) = self
            .client_config()
            .connect(tokio_postgres::NoTls)
            .await
            .map_err(|e| {
                DatabaseError::ConnectionFailed(format!(
                    "Failed to connect to {}: {}",
                    self.warehouse.summary(),
                    e
                ))
            })?;

        // Spawn connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("warehouse connection error: {}", e);
            }
        });

        Ok(PostgresSession { client })
    }
}

/// A connected warehouse session
pub struct PostgresSession {
    client: tokio_postgres::Client,
}

impl PostgresSession {
    /// Convert a row to a JSON value
    fn row_to_json(row: &tokio_postgres::Row, columns: &[String]) -> serde_json::Value {
        let mut map = serde_json::Map::new();

        for (i, col_name) in columns.iter().enumerate() {
            map.insert(col_name.clone(), Self::get_column_value(row, i));
        }

        serde_json::Value::Object(map)
    }

    /// Get a column value as JSON
    fn get_column_value(row: &tokio_postgres::Row, idx: usize) -> serde_json::Value {
        if let Ok(v) = row.try_get::<_, Option<String>>(idx) {
            return v
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null);
        }
        if let Ok(v) = row.try_get::<_, Option<i64>>(idx) {
            return v
                .map(|n| serde_json::Value::Number(n.into()))
                .unwrap_or(serde_json::Value::Null);
        }
        if let Ok(v) = row.try_get::<_, Option<i32>>(idx) {
            return v
                .map(|n| serde_json::Value::Number(n.into()))
                .unwrap_or(serde_json::Value::Null);
        }
        if let Ok(v) = row.try_get::<_, Option<bool>>(idx) {
            return v
                .map(serde_json::Value::Bool)
                .unwrap_or(serde_json::Value::Null);
        }
        if let Ok(v) = row.try_get::<_, Option<f64>>(idx) {
            return v
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null);
        }

        serde_json::Value::Null
    }

    async fn simple(&self, sql: &str) -> Result<(), tokio_postgres::Error> {
        self.client.batch_execute(sql).await
    }
}

#[async_trait(?Send)]
impl WarehouseSession for PostgresSession {
    async fn execute(&self, sql: &str) -> DatabaseResult<()> {
        // Simple-query protocol: COPY and DDL carry no bind parameters
        self.simple(sql)
            .await
            .map_err(|e| DatabaseError::QueryFailed(describe(&e)))
    }

    async fn begin(&self) -> DatabaseResult<()> {
        self.simple("BEGIN")
            .await
            .map_err(|e| DatabaseError::TransactionFailed(format!("BEGIN: {}", describe(&e))))
    }

    async fn commit(&self) -> DatabaseResult<()> {
        self.simple("COMMIT")
            .await
            .map_err(|e| DatabaseError::TransactionFailed(format!("COMMIT: {}", describe(&e))))
    }

    async fn rollback(&self) -> DatabaseResult<()> {
        self.simple("ROLLBACK").await.map_err(|e| {
            DatabaseError::TransactionFailed(format!("ROLLBACK: {}", describe(&e)))
        })
    }

    async fn query(
        &self,
        sql: &str,
        params: &[serde_json::Value],
    ) -> DatabaseResult<QueryResult> {
        let start = Instant::now();

        // Convert JSON params to strings for simplicity
        let string_params: Vec<String> = params
            .iter()
            .map(|p| match p {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect();

        let param_refs: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = string_params
            .iter()
            .map(|s| s as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect();

        let rows = self
            .client
            .query(sql, &param_refs)
            .await
            .map_err(|e| DatabaseError::QueryFailed(describe(&e)))?;

        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let json_rows: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| Self::row_to_json(row, &columns))
            .collect();

        let result = QueryResult {
            columns,
            rows: json_rows,
            execution_time_ms: start.elapsed().as_millis() as u64,
        };
        tracing::debug!(
            rows = result.row_count(),
            ms = result.execution_time_ms,
            "query finished"
        );
        Ok(result)
    }

    async fn close(&self) -> DatabaseResult<()> {
        // The connection is closed when the client is dropped
        tracing::debug!("closing warehouse session");
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "postgres"
    }
}

/// Prefer the server's message (and detail) over the driver's generic "db error"
fn describe(error: &tokio_postgres::Error) -> String {
    match error.as_db_error() {
        Some(db) => match db.detail() {
            Some(detail) => format!("{}: {} ({})", db.code().code(), db.message(), detail),
            None => format!("{}: {}", db.code().code(), db.message()),
        },
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_carries_warehouse_settings() {
        let connector = PostgresConnector::new(WarehouseSection {
            host: "cluster.example.com".to_string(),
            port: 5439,
            database: "dev".to_string(),
            user: "loader".to_string(),
            password: Some("secret".to_string()),
            connect_timeout_secs: Some(15),
        });

        let config = connector.client_config();
        assert_eq!(config.get_ports(), &[5439]);
        assert_eq!(config.get_dbname(), Some("dev"));
        assert_eq!(config.get_user(), Some("loader"));
        assert_eq!(config.get_password(), Some("secret".as_bytes()));
        assert_eq!(config.get_connect_timeout(), Some(&Duration::from_secs(15)));
    }
}
