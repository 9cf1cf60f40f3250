//! Database abstraction layer.
//!
//! Provides a trait-based interface for opening sessions and running report
//! queries, so the driver never depends on a concrete backend.

mod mock;
mod postgres;
mod types;

pub use mock::{MockConnector, MockResponse, SessionStats};
pub use postgres::{PostgresClient, PostgresConnector};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Opens a single PostgreSQL session for the given configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(
    config: &ConnectionConfig,
    query_timeout: Duration,
) -> Result<Box<dyn DatabaseClient>> {
    let client = PostgresClient::connect(config, query_timeout).await?;
    Ok(Box::new(client))
}

/// A live database session.
///
/// The owner must call [`DatabaseClient::close`] once it is done, whether or
/// not its queries succeeded.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Executes a SQL query and returns the fully materialized results.
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult>;

    /// Closes the session. Closing twice is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Produces independent sessions on demand.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a fresh session. Sessions are never shared or reused.
    async fn connect(&self) -> Result<Box<dyn DatabaseClient>>;

    /// Display-safe description of the target, for logs.
    fn describe(&self) -> String;
}
