//! The built-in catalog reports, in the order they run.

use super::sql::{quote_identifier_path, quote_literal};
use super::ReportDefinition;
use crate::config::ReportSettings;

/// Builds the built-in report list from the given settings.
pub fn builtin_reports(settings: &ReportSettings) -> Vec<ReportDefinition> {
    let out = |file: &str| settings.output_dir.join(file);

    vec![
        ReportDefinition::console(
            "general_info",
            "General Info",
            general_info_query(&settings.schema),
        ),
        ReportDefinition::console(
            "project_tables",
            pattern_label(&settings.project_pattern),
            tables_like_query(&settings.project_pattern),
        ),
        ReportDefinition::console(
            "issue_tables",
            pattern_label(&settings.issue_pattern),
            tables_like_query(&settings.issue_pattern),
        ),
        ReportDefinition::console(
            "total_projects",
            "Total Projects",
            count_query(&settings.project_table, "total_projects"),
        ),
        ReportDefinition::console(
            "total_issues",
            "Total Issues",
            count_query(&settings.issue_table, "total_issues"),
        ),
        ReportDefinition::file("tables", "Tables", TABLES_QUERY, out("tables.csv")),
        ReportDefinition::file(
            "table_stats",
            "Table Stats",
            table_stats_query("schemaname, relname"),
            out("table_stats.csv"),
        ),
        ReportDefinition::file(
            "table_stats_ordered",
            "Table Stats (by size)",
            table_stats_query("table_size_bytes DESC, schemaname, relname"),
            out("table_stats_ordered.csv"),
        ),
    ]
}

const TABLES_QUERY: &str = r#"
SELECT table_schema::text AS table_schema, table_name::text AS table_name
FROM information_schema.tables
WHERE table_type = 'BASE TABLE'
  AND table_schema NOT IN ('pg_catalog', 'information_schema')
ORDER BY table_schema, table_name
"#;

fn general_info_query(schema: &str) -> String {
    format!(
        r#"
SELECT
    CASE
        WHEN relkind = 'r' THEN 'Tables'
        WHEN relkind = 'v' THEN 'Views'
        WHEN relkind = 'i' THEN 'Indexes'
        WHEN relkind = 'S' THEN 'Sequences'
        ELSE 'Other'
    END AS object_type,
    COUNT(*) AS count
FROM pg_class
WHERE relnamespace = (SELECT oid FROM pg_namespace WHERE nspname = {})
GROUP BY object_type
ORDER BY object_type
"#,
        quote_literal(schema)
    )
}

fn tables_like_query(pattern: &str) -> String {
    format!(
        r#"
SELECT table_schema::text AS table_schema, table_name::text AS table_name
FROM information_schema.tables
WHERE table_name LIKE {}
ORDER BY table_schema, table_name
"#,
        quote_literal(pattern)
    )
}

fn count_query(table: &str, alias: &str) -> String {
    format!(
        "SELECT COUNT(*) AS {alias} FROM {}",
        quote_identifier_path(table)
    )
}

fn table_stats_query(order_by: &str) -> String {
    format!(
        r#"
SELECT schemaname::text AS table_schema,
       relname::text AS table_name,
       n_live_tup AS row_count,
       pg_total_relation_size(relid) AS table_size_bytes
FROM pg_stat_user_tables
ORDER BY {order_by}
"#
    )
}

/// Label for a table-name pattern report, named after its last literal fragment.
///
/// `%jira%issue%` is labelled "Tables containing 'issue'".
fn pattern_label(pattern: &str) -> String {
    let fragment = pattern
        .split('%')
        .rfind(|part| !part.is_empty())
        .unwrap_or(pattern);
    format!("Tables containing '{fragment}'")
}
