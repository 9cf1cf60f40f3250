//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient` trait
//! on a single unpooled sqlx connection.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, Connector, DatabaseClient, QueryResult, Row, Value};
use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow, Postgres};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, Uuid};
use sqlx::{
    Column as SqlxColumn, Connection, Decode, Executor, Row as SqlxRow, Statement, Type,
    TypeInfo, ValueRef,
};
use std::time::{Duration, Instant};
use tracing::debug;

/// Connection timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Name reported to the server in `pg_stat_activity`.
const APPLICATION_NAME: &str = "catalog-report";

/// A single PostgreSQL session.
#[derive(Debug)]
pub struct PostgresClient {
    conn: Option<PgConnection>,
    query_timeout: Duration,
}

impl PostgresClient {
    /// Opens a new session. Fails with a connection error naming the cause.
    pub async fn connect(config: &ConnectionConfig, query_timeout: Duration) -> Result<Self> {
        let options = connect_options(config)?;

        debug!("Connecting to {}", config.display_string());

        let conn = tokio::time::timeout(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            PgConnection::connect_with(&options),
        )
        .await
        .map_err(|_| {
            CatalogError::connection(format!(
                "Connection to {}:{} timed out after {CONNECT_TIMEOUT_SECS} seconds.",
                config.host_or_default(),
                config.port
            ))
        })?
        .map_err(|e| map_connection_error(e, config))?;

        debug!("Successfully connected to database");

        Ok(Self {
            conn: Some(conn),
            query_timeout,
        })
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| CatalogError::internal("query issued on a closed session"))?;

        let start = Instant::now();

        let (columns, pg_rows) = tokio::time::timeout(self.query_timeout, fetch(conn, sql))
            .await
            .map_err(|_| {
                CatalogError::query(format!(
                    "Query timed out after {} seconds",
                    self.query_timeout.as_secs()
                ))
            })?
            .map_err(|e| CatalogError::query(format_query_error(e)))?;

        let rows = pg_rows
            .iter()
            .map(|row| convert_row(row, &columns))
            .collect::<Result<Vec<Row>>>()?;

        Ok(QueryResult::with_data(columns, rows).with_execution_time(start.elapsed()))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| CatalogError::connection(format!("Failed to close session: {e}")))?;
            debug!("Session closed");
        }
        Ok(())
    }
}

/// Opens a fresh [`PostgresClient`] for every report.
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    config: ConnectionConfig,
    query_timeout: Duration,
}

impl PostgresConnector {
    /// Creates a connector for the given configuration.
    pub fn new(config: ConnectionConfig, query_timeout: Duration) -> Self {
        Self {
            config,
            query_timeout,
        }
    }
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn connect(&self) -> Result<Box<dyn DatabaseClient>> {
        super::connect(&self.config, self.query_timeout).await
    }

    fn describe(&self) -> String {
        self.config.display_string()
    }
}

/// Builds sqlx connect options from our config.
fn connect_options(config: &ConnectionConfig) -> Result<PgConnectOptions> {
    let mut options = PgConnectOptions::new()
        .host(config.host_or_default())
        .port(config.port)
        .database(config.require_database()?)
        .application_name(APPLICATION_NAME);

    if let Some(user) = &config.user {
        options = options.username(user);
    }
    if let Some(password) = &config.password {
        options = options.password(password);
    }

    Ok(options)
}

/// Prepares the statement for its column metadata, then fetches every row.
///
/// Preparing first keeps column names available for empty results.
async fn fetch(
    conn: &mut PgConnection,
    sql: &str,
) -> std::result::Result<(Vec<ColumnInfo>, Vec<PgRow>), sqlx::Error> {
    let statement = Executor::prepare(&mut *conn, sql).await?;
    let columns = statement
        .columns()
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect();

    let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;

    Ok((columns, rows))
}

/// Converts a sqlx PgRow to our Row type using the prepared column types.
fn convert_row(row: &PgRow, columns: &[ColumnInfo]) -> Result<Row> {
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| convert_value(row, index, column))
        .collect()
}

/// Decodes a single column value exactly.
///
/// Types without a lossless mapping fail the query instead of becoming NULL.
fn convert_value(row: &PgRow, index: usize, column: &ColumnInfo) -> Result<Value> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| decode_error(column, e))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let value = match column.data_type.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => Value::Bool(decode(row, index, column)?),
        "INT2" | "SMALLINT" => Value::Int(decode::<i16>(row, index, column)?.into()),
        "INT4" | "INT" | "INTEGER" => Value::Int(decode::<i32>(row, index, column)?.into()),
        "INT8" | "BIGINT" => Value::Int(decode(row, index, column)?),
        "OID" => Value::Int(decode::<Oid>(row, index, column)?.0.into()),
        "FLOAT4" | "REAL" => Value::Float(decode::<f32>(row, index, column)?.into()),
        "FLOAT8" | "DOUBLE PRECISION" => Value::Float(decode(row, index, column)?),
        "NUMERIC" => Value::String(decode::<Decimal>(row, index, column)?.to_string()),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" | "UNKNOWN" => {
            Value::String(decode(row, index, column)?)
        }
        // The single-byte internal "char" type
        "\"CHAR\"" => {
            Value::String(char::from(decode::<i8>(row, index, column)? as u8).to_string())
        }
        "DATE" => Value::String(decode::<NaiveDate>(row, index, column)?.to_string()),
        "TIME" => Value::String(decode::<NaiveTime>(row, index, column)?.to_string()),
        "TIMESTAMP" => Value::String(decode::<NaiveDateTime>(row, index, column)?.to_string()),
        "TIMESTAMPTZ" => Value::String(decode::<DateTime<Utc>>(row, index, column)?.to_rfc3339()),
        "UUID" => Value::String(decode::<Uuid>(row, index, column)?.to_string()),
        "BYTEA" => Value::Bytes(decode(row, index, column)?),
        _ => {
            return Err(CatalogError::query(format!(
                "Column '{}' has unsupported type {}; cast it to text in the query",
                column.name, column.data_type
            )))
        }
    };

    Ok(value)
}

fn decode<'r, T>(row: &'r PgRow, index: usize, column: &ColumnInfo) -> Result<T>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get(index).map_err(|e| decode_error(column, e))
}

fn decode_error(column: &ColumnInfo, error: sqlx::Error) -> CatalogError {
    CatalogError::query(format!(
        "Cannot decode column '{}' ({}): {error}",
        column.name, column.data_type
    ))
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> CatalogError {
    let host = config.host_or_default();
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        CatalogError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        CatalogError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        CatalogError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        CatalogError::connection(
            "Server requires SSL. Add '?sslmode=require' to connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        CatalogError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        CatalogError::connection(format!("Cannot connect to {host}:{port}: {error}"))
    }
}

/// Formats a query error with detail and hint if available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }

        if let Some(table) = pg_error.table() {
            result.push_str("\n  TABLE: ");
            result.push_str(table);
        }
    }

    result
}
