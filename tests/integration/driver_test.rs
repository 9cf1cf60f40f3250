//! Driver tests against the in-memory connector.
//!
//! Exercise the built-in report list end to end without a database.

use super::common::{parse_csv, text_result};
use catalog_report::config::ReportSettings;
use catalog_report::db::{ColumnInfo, MockConnector, QueryResult, Value};
use catalog_report::driver::Driver;
use catalog_report::error::CatalogError;
use catalog_report::report::{builtin_reports, Emission, ReportDefinition};
use pretty_assertions::assert_eq;
use std::path::Path;

fn count(column: &str, n: i64) -> QueryResult {
    QueryResult::with_data(vec![ColumnInfo::new(column, "INT8")], vec![vec![Value::Int(n)]])
}

/// A connector that answers every built-in query.
fn connector_for(reports: &[ReportDefinition]) -> MockConnector {
    let mut connector = MockConnector::new();
    for report in reports {
        let result = match report.name.as_str() {
            "general_info" => QueryResult::with_data(
                vec![
                    ColumnInfo::new("object_type", "TEXT"),
                    ColumnInfo::new("count", "INT8"),
                ],
                vec![
                    vec![Value::String("Indexes".into()), Value::Int(4)],
                    vec![Value::String("Tables".into()), Value::Int(2)],
                ],
            ),
            "project_tables" => text_result(
                &["table_schema", "table_name"],
                &[&["public", "project"]],
            ),
            "issue_tables" => text_result(&["table_schema", "table_name"], &[]),
            "total_projects" => count("total_projects", 5),
            "total_issues" => count("total_issues", 42),
            "tables" => text_result(
                &["table_schema", "table_name"],
                &[&["public", "jiraissue"], &["public", "project"]],
            ),
            _ => QueryResult::with_data(
                vec![
                    ColumnInfo::new("table_schema", "TEXT"),
                    ColumnInfo::new("table_name", "TEXT"),
                    ColumnInfo::new("row_count", "INT8"),
                    ColumnInfo::new("table_size_bytes", "INT8"),
                ],
                vec![vec![
                    Value::String("public".into()),
                    Value::String("project".into()),
                    Value::Int(5),
                    Value::Int(16_384),
                ]],
            ),
        };
        connector = connector.with_result(report.query.clone(), result);
    }
    connector
}

fn settings_in(dir: &Path) -> ReportSettings {
    ReportSettings {
        output_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_full_run_console_and_files() {
    let dir = tempfile::tempdir().unwrap();
    let reports = builtin_reports(&settings_in(dir.path()));
    let connector = connector_for(&reports);
    let stats = connector.stats();

    let mut out = Vec::new();
    let summary = Driver::new(connector, reports).run(&mut out).await;

    assert!(summary.all_succeeded());
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "General Info: (Indexes, 4), (Tables, 2)\n\
         Tables containing 'project': (public, project)\n\
         Tables containing 'issue': (no rows)\n\
         Total Projects: (5)\n\
         Total Issues: (42)\n"
    );

    let tables = std::fs::read_to_string(dir.path().join("tables.csv")).unwrap();
    assert_eq!(tables, "table_schema,table_name\r\npublic,jiraissue\r\npublic,project\r\n");

    for file in ["table_stats.csv", "table_stats_ordered.csv"] {
        let records = parse_csv(&std::fs::read_to_string(dir.path().join(file)).unwrap());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], vec!["public", "project", "5", "16384"]);
    }

    // One session per report, all released
    assert_eq!(stats.opened(), 8);
    assert_eq!(stats.leaked(), 0);
}

#[tokio::test]
async fn test_same_report_twice_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let reports: Vec<_> = builtin_reports(&settings_in(dir.path()))
        .into_iter()
        .filter(|r| r.name == "table_stats")
        .collect();
    let path = match &reports[0].emission {
        Emission::File(path) => path.clone(),
        Emission::Console => panic!("table_stats should write a file"),
    };

    let driver = Driver::new(connector_for(&reports), reports);
    let mut out = Vec::new();

    assert!(driver.run(&mut out).await.all_succeeded());
    let first = std::fs::read(&path).unwrap();

    assert!(driver.run(&mut out).await.all_succeeded());
    let second = std::fs::read(&path).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unwritable_output_dir_fails_only_file_reports() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file standing where the output directory should be
    let blocked = dir.path().join("exports");
    std::fs::write(&blocked, "").unwrap();

    let reports = builtin_reports(&settings_in(&blocked));
    let connector = connector_for(&reports);
    let stats = connector.stats();

    let mut out = Vec::new();
    let summary = Driver::new(connector, reports).run(&mut out).await;

    assert_eq!(
        summary.failed(),
        vec!["tables", "table_stats", "table_stats_ordered"]
    );
    for outcome in summary.outcomes.iter().filter(|o| !o.succeeded()) {
        assert!(matches!(outcome.result, Err(CatalogError::Io { .. })));
    }
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 5);
    assert_eq!(summary.exit_code(), 1);
    assert_eq!(stats.leaked(), 0);
}

#[tokio::test]
async fn test_zero_matching_tables_is_not_an_error() {
    let reports: Vec<_> = builtin_reports(&ReportSettings::default())
        .into_iter()
        .filter(|r| r.name == "issue_tables")
        .collect();

    let mut out = Vec::new();
    let summary = Driver::new(connector_for(&reports), reports)
        .run(&mut out)
        .await;

    assert!(summary.all_succeeded());
    assert_eq!(*summary.outcomes[0].result.as_ref().unwrap(), 0);
}
