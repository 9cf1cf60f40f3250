//! Connection integration tests.
//!
//! Tests database connectivity and error handling.

use super::common::test_connection;
use catalog_report::config::ConnectionConfig;
use catalog_report::db::{Connector, DatabaseClient, PostgresClient, PostgresConnector};
use catalog_report::error::CatalogError;
use std::time::Duration;

#[tokio::test]
async fn test_connect_with_valid_credentials() {
    let Some(config) = test_connection() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut client = PostgresClient::connect(&config, Duration::from_secs(30))
        .await
        .unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_connector_sessions_are_independent() {
    let Some(config) = test_connection() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let connector = PostgresConnector::new(config, Duration::from_secs(30));
    let mut first = connector.connect().await.unwrap();
    let mut second = connector.connect().await.unwrap();

    let pid_query = "SELECT pg_backend_pid()::int8 AS pid";
    let a = first.execute_query(pid_query).await.unwrap();
    let b = second.execute_query(pid_query).await.unwrap();
    assert_ne!(a.rows, b.rows);

    first.close().await.unwrap();
    second.close().await.unwrap();
}

#[tokio::test]
async fn test_wrong_password_is_connection_error() {
    let Some(mut config) = test_connection() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    config.password = Some("definitely-not-the-password".to_string());

    match PostgresClient::connect(&config, Duration::from_secs(30)).await {
        Err(err) => assert!(matches!(err, CatalogError::Connection(_))),
        // Trust authentication accepts any password
        Ok(mut client) => client.close().await.unwrap(),
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_with_invalid_host() {
    let config = ConnectionConfig {
        host: Some("invalid.host.that.does.not.exist.local".to_string()),
        port: 5432,
        database: Some("testdb".to_string()),
        user: Some("testuser".to_string()),
        password: Some("testpass".to_string()),
    };

    let err = PostgresClient::connect(&config, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Connection(_)));
    assert!(!err.to_string().contains("testpass"));
}

#[tokio::test(flavor = "current_thread")]
async fn test_connect_with_invalid_port() {
    let config = ConnectionConfig {
        host: Some("127.0.0.1".to_string()),
        port: 59999, // Unlikely to be in use
        database: Some("testdb".to_string()),
        user: Some("testuser".to_string()),
        password: Some("testpass".to_string()),
    };

    let result = PostgresClient::connect(&config, Duration::from_secs(5)).await;
    assert!(matches!(result, Err(CatalogError::Connection(_))));
}

#[tokio::test]
async fn test_missing_database_name_is_config_error() {
    let config = ConnectionConfig {
        host: Some("localhost".to_string()),
        ..Default::default()
    };

    let result = PostgresClient::connect(&config, Duration::from_secs(5)).await;
    assert!(matches!(result, Err(CatalogError::Config(_))));
}
