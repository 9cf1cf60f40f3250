//! Shared helpers for integration tests.

use catalog_report::config::ConnectionConfig;
use catalog_report::db::{ColumnInfo, QueryResult, Value};

/// Helper to get the test connection from DATABASE_URL.
pub fn test_connection() -> Option<ConnectionConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    ConnectionConfig::from_connection_string(&url).ok()
}

/// Builds a result of string columns.
pub fn text_result(columns: &[&str], rows: &[&[&str]]) -> QueryResult {
    QueryResult::with_data(
        columns.iter().map(|c| ColumnInfo::new(*c, "TEXT")).collect(),
        rows.iter()
            .map(|row| row.iter().map(|v| Value::String(v.to_string())).collect())
            .collect(),
    )
}

/// Parses CSV text into records, undoing quote escaping.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}
