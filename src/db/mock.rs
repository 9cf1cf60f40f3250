//! Mock database client for testing.
//!
//! Provides an in-memory connector whose sessions answer queries from a table
//! of canned responses and count how many sessions were opened and closed.

use super::{Connector, DatabaseClient, QueryResult};
use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Canned response for one query text.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The query succeeds with this result.
    Rows(QueryResult),
    /// The query fails with this message.
    Error(String),
}

/// Session bookkeeping shared by a connector and its sessions.
#[derive(Debug, Default)]
pub struct SessionStats {
    opened: AtomicUsize,
    closed: AtomicUsize,
    queries: AtomicUsize,
}

impl SessionStats {
    /// Sessions opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Sessions closed so far.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Sessions opened but never closed.
    pub fn leaked(&self) -> usize {
        self.opened().saturating_sub(self.closed())
    }

    /// Queries executed across all sessions.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

/// A connector that hands out in-memory sessions.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    responses: Arc<HashMap<String, MockResponse>>,
    connect_error: Option<String>,
    stats: Arc<SessionStats>,
}

impl MockConnector {
    /// Creates a connector whose sessions know no queries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a successful result for the given query text.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        Arc::make_mut(&mut self.responses).insert(sql.into(), MockResponse::Rows(result));
        self
    }

    /// Registers a failure for the given query text.
    pub fn with_query_error(mut self, sql: impl Into<String>, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.responses)
            .insert(sql.into(), MockResponse::Error(message.into()));
        self
    }

    /// Makes every connection attempt fail with the given message.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    /// Shared session counters.
    pub fn stats(&self) -> Arc<SessionStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn DatabaseClient>> {
        if let Some(message) = &self.connect_error {
            return Err(CatalogError::connection(message.clone()));
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDatabaseClient {
            responses: Arc::clone(&self.responses),
            stats: Arc::clone(&self.stats),
            open: true,
        }))
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

/// A session backed by the connector's canned responses.
struct MockDatabaseClient {
    responses: Arc<HashMap<String, MockResponse>>,
    stats: Arc<SessionStats>,
    open: bool,
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        if !self.open {
            return Err(CatalogError::internal("query issued on a closed session"));
        }

        self.stats.queries.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(sql) {
            Some(MockResponse::Rows(result)) => Ok(result.clone()),
            Some(MockResponse::Error(message)) => Err(CatalogError::query(message.clone())),
            None => Err(CatalogError::query(format!("no mock result for: {sql}"))),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
